//! Subtask queries. Every query is scoped to a parent task; callers resolve
//! the parent through an owner-scoped lookup first.

use super::Database;
use crate::error::ApiError;
use crate::types::{Subtask, SubtaskId, TaskId, UserId};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashMap;

const SUBTASK_COLUMNS: &str = "id, task_id, title, is_completed, created_at, updated_at";

pub fn parse_subtask_row(row: &Row) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        title: row.get("title")?,
        is_completed: row.get("is_completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Insert a new, not yet completed subtask under `task_id`.
pub(crate) fn insert_subtask(
    conn: &Connection,
    task_id: TaskId,
    title: &str,
    now: i64,
) -> Result<SubtaskId> {
    conn.execute(
        "INSERT INTO subtasks (task_id, title, is_completed, created_at, updated_at)
         VALUES (?1, ?2, 0, ?3, ?3)",
        params![task_id, title, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Resolve a subtask by id, but only if it belongs to `task_id`.
pub(crate) fn find_in_task_or_fail(
    conn: &Connection,
    task_id: TaskId,
    subtask_id: SubtaskId,
) -> Result<Subtask> {
    let sql = format!(
        "SELECT {} FROM subtasks WHERE id = ?1 AND task_id = ?2",
        SUBTASK_COLUMNS
    );
    conn.query_row(&sql, params![subtask_id, task_id], parse_subtask_row)
        .optional()?
        .ok_or_else(|| ApiError::subtask_not_found(subtask_id).into())
}

pub(crate) fn retitle_subtask(
    conn: &Connection,
    subtask_id: SubtaskId,
    title: &str,
    now: i64,
) -> Result<()> {
    conn.execute(
        "UPDATE subtasks SET title = ?1, updated_at = ?2 WHERE id = ?3",
        params![title, now, subtask_id],
    )?;
    Ok(())
}

/// Subtasks of one task in insertion order.
pub(crate) fn list_for_task(conn: &Connection, task_id: TaskId) -> Result<Vec<Subtask>> {
    let sql = format!(
        "SELECT {} FROM subtasks WHERE task_id = ?1 ORDER BY id",
        SUBTASK_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let subtasks = stmt
        .query_map(params![task_id], parse_subtask_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(subtasks)
}

/// All subtasks of all tasks owned by `owner`, grouped by parent task.
pub(crate) fn list_for_owner(
    conn: &Connection,
    owner: UserId,
) -> Result<HashMap<TaskId, Vec<Subtask>>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.task_id, s.title, s.is_completed, s.created_at, s.updated_at
         FROM subtasks s
         JOIN tasks t ON t.id = s.task_id
         WHERE t.user_id = ?1
         ORDER BY s.id",
    )?;

    let mut grouped: HashMap<TaskId, Vec<Subtask>> = HashMap::new();
    let rows = stmt.query_map(params![owner.get()], parse_subtask_row)?;
    for subtask in rows {
        let subtask = subtask?;
        grouped.entry(subtask.task_id).or_default().push(subtask);
    }
    Ok(grouped)
}

/// Delete every subtask of `task_id`, returning how many were removed.
pub(crate) fn delete_for_task(conn: &Connection, task_id: TaskId) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM subtasks WHERE task_id = ?1", params![task_id])?;
    Ok(deleted)
}

impl Database {
    /// Look up a subtask directly by its parent task id and its own id.
    ///
    /// Not owner-scoped; fails with `SUBTASK_NOT_FOUND` when the pair does
    /// not exist.
    pub fn find_subtask(&self, task_id: TaskId, subtask_id: SubtaskId) -> Result<Subtask> {
        self.with_conn(|conn| find_in_task_or_fail(conn, task_id, subtask_id))
    }

    /// List the subtasks stored under a task id (empty if none).
    pub fn list_subtasks(&self, task_id: TaskId) -> Result<Vec<Subtask>> {
        self.with_conn(|conn| list_for_task(conn, task_id))
    }
}
