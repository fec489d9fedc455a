//! Task synchronization service.
//!
//! Entry point for every task operation. Each call takes the caller's
//! identity explicitly, validates the payload where there is one and
//! delegates to the owner-scoped queries in [`crate::db`].

use crate::db::Database;
use crate::error::ApiResult;
use crate::types::{DeleteConfirmation, Task, TaskId, UserId};
use crate::validation::validate_task_payload;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct TaskService {
    db: Arc<Database>,
}

impl TaskService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn list(&self, owner: UserId) -> ApiResult<Vec<Task>> {
        let tasks = self.db.list_tasks(owner)?;
        debug!(user_id = %owner, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    pub fn create(&self, owner: UserId, payload: &Value) -> ApiResult<Task> {
        let input = validate_task_payload(payload)?;
        let task = self.db.create_task(owner, &input)?;
        debug!(
            user_id = %owner,
            task_id = task.id,
            subtasks = task.subtasks.len(),
            "Created task"
        );
        Ok(task)
    }

    pub fn show(&self, owner: UserId, task_id: TaskId) -> ApiResult<Task> {
        Ok(self.db.get_task(owner, task_id)?)
    }

    /// Full replace of the task's scalar fields plus upsert of the listed
    /// subtasks. Validation runs before the task is looked up.
    pub fn update(&self, owner: UserId, task_id: TaskId, payload: &Value) -> ApiResult<Task> {
        let input = validate_task_payload(payload)?;
        let task = self.db.update_task(owner, task_id, &input)?;
        debug!(
            user_id = %owner,
            task_id,
            subtasks = input.subtask_count(),
            "Updated task"
        );
        Ok(task)
    }

    pub fn delete(&self, owner: UserId, task_id: TaskId) -> ApiResult<DeleteConfirmation> {
        let removed = self.db.delete_task(owner, task_id)?;
        debug!(user_id = %owner, task_id, subtasks = removed, "Deleted task");
        Ok(DeleteConfirmation::default())
    }
}
