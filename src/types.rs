//! Core types for the taskboard service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned task identifier.
pub type TaskId = i64;

/// Store-assigned subtask identifier.
pub type SubtaskId = i64;

/// Identity of the authenticated caller. Every task belongs to exactly one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task with its subtasks attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub label: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub reminder: Option<NaiveDate>,
    pub created_at: i64,
    pub updated_at: i64,

    /// Subtasks in insertion order.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// A checklist item owned by a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: SubtaskId,
    pub task_id: TaskId,
    pub title: String,
    pub is_completed: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Validated task payload used by both create and update.
///
/// Update applies every scalar field as-is, so a `None` here clears the
/// stored value rather than leaving it unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub label: Option<String>,
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub reminder: Option<NaiveDate>,

    /// `None` when the payload carried no `subtasks` key (or null).
    pub subtasks: Option<Vec<SubtaskInput>>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_subtasks(mut self, subtasks: Vec<SubtaskInput>) -> Self {
        self.subtasks = Some(subtasks);
        self
    }

    /// Number of subtask entries in the payload.
    pub fn subtask_count(&self) -> usize {
        self.subtasks.as_ref().map_or(0, Vec::len)
    }
}

/// One entry of a payload's `subtasks` array.
///
/// With an `id` it targets an existing subtask of the same task; without one
/// it becomes a new subtask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskInput {
    pub id: Option<SubtaskId>,
    pub title: String,
}

impl SubtaskInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
        }
    }

    pub fn existing(id: SubtaskId, title: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            title: title.into(),
        }
    }
}

/// Body returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}

impl Default for DeleteConfirmation {
    fn default() -> Self {
        Self {
            message: "Task deleted successfully".to_string(),
        }
    }
}
