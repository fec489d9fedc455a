//! Owner-scoped task CRUD and subtask synchronization.

use super::subtasks::{
    delete_for_task, find_in_task_or_fail, insert_subtask, list_for_owner, list_for_task,
    retitle_subtask,
};
use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::{Task, TaskId, TaskInput, UserId};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const TASK_COLUMNS: &str = "id, user_id, title, description, category, label, priority, \
                            due_date, reminder, created_at, updated_at";

/// Parse a task row. Subtasks are attached separately.
pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        user_id: UserId(row.get("user_id")?),
        title: row.get("title")?,
        description: row.get("description")?,
        category: row.get("category")?,
        label: row.get("label")?,
        priority: row.get("priority")?,
        due_date: row.get("due_date")?,
        reminder: row.get("reminder")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        subtasks: Vec::new(),
    })
}

/// Resolve a task by id and owner. A task owned by someone else is
/// reported exactly like a missing one.
pub(crate) fn find_owned_or_fail(conn: &Connection, task_id: TaskId, owner: UserId) -> Result<Task> {
    let sql = format!(
        "SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2",
        TASK_COLUMNS
    );
    conn.query_row(&sql, params![task_id, owner.get()], parse_task_row)
        .optional()?
        .ok_or_else(|| ApiError::task_not_found(task_id).into())
}

fn with_subtasks(conn: &Connection, mut task: Task) -> Result<Task> {
    task.subtasks = list_for_task(conn, task.id)?;
    Ok(task)
}

/// Apply the payload's subtask entries to `task_id`: entries with an id
/// retitle that subtask, entries without one insert a new subtask.
/// Stored subtasks missing from the payload are left alone.
fn upsert_subtasks(conn: &Connection, task_id: TaskId, input: &TaskInput, now: i64) -> Result<()> {
    let Some(entries) = &input.subtasks else {
        return Ok(());
    };

    for entry in entries {
        match entry.id {
            Some(subtask_id) => {
                find_in_task_or_fail(conn, task_id, subtask_id)?;
                retitle_subtask(conn, subtask_id, &entry.title, now)?;
            }
            None => {
                insert_subtask(conn, task_id, &entry.title, now)?;
            }
        }
    }
    Ok(())
}

impl Database {
    /// All tasks owned by `owner`, each with its subtasks.
    pub fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM tasks WHERE user_id = ?1 ORDER BY id",
                TASK_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut tasks = stmt
                .query_map(params![owner.get()], parse_task_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut subtasks = list_for_owner(conn, owner)?;
            for task in &mut tasks {
                task.subtasks = subtasks.remove(&task.id).unwrap_or_default();
            }

            Ok(tasks)
        })
    }

    /// Get one task owned by `owner`, with subtasks.
    pub fn get_task(&self, owner: UserId, task_id: TaskId) -> Result<Task> {
        self.with_conn(|conn| {
            let task = find_owned_or_fail(conn, task_id, owner)?;
            with_subtasks(conn, task)
        })
    }

    /// Create a task for `owner` plus one new subtask per payload entry.
    ///
    /// Subtask ids in the payload are ignored: nothing can be updated on a
    /// task that does not exist yet.
    pub fn create_task(&self, owner: UserId, input: &TaskInput) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO tasks (
                    user_id, title, description, category, label, priority,
                    due_date, reminder, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    owner.get(),
                    &input.title,
                    &input.description,
                    &input.category,
                    &input.label,
                    &input.priority,
                    input.due_date,
                    input.reminder,
                    now,
                ],
            )?;
            let task_id = tx.last_insert_rowid();

            for entry in input.subtasks.iter().flatten() {
                insert_subtask(&tx, task_id, &entry.title, now)?;
            }

            let task = find_owned_or_fail(&tx, task_id, owner)?;
            let task = with_subtasks(&tx, task)?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Replace every scalar field of an owned task and upsert its subtasks.
    ///
    /// Runs in one transaction; an unknown subtask id rolls back the whole
    /// update.
    pub fn update_task(&self, owner: UserId, task_id: TaskId, input: &TaskInput) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            find_owned_or_fail(&tx, task_id, owner)?;

            tx.execute(
                "UPDATE tasks SET
                    title = ?1, description = ?2, category = ?3, label = ?4,
                    priority = ?5, due_date = ?6, reminder = ?7, updated_at = ?8
                 WHERE id = ?9 AND user_id = ?10",
                params![
                    &input.title,
                    &input.description,
                    &input.category,
                    &input.label,
                    &input.priority,
                    input.due_date,
                    input.reminder,
                    now,
                    task_id,
                    owner.get(),
                ],
            )?;

            upsert_subtasks(&tx, task_id, input, now)?;

            let task = find_owned_or_fail(&tx, task_id, owner)?;
            let task = with_subtasks(&tx, task)?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete an owned task and its subtasks (children first).
    /// Returns the number of subtasks removed.
    pub fn delete_task(&self, owner: UserId, task_id: TaskId) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            find_owned_or_fail(&tx, task_id, owner)?;

            let removed = delete_for_task(&tx, task_id)?;
            tx.execute(
                "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
                params![task_id, owner.get()],
            )?;

            tx.commit()?;
            Ok(removed)
        })
    }
}
