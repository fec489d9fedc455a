//! Integration tests for the database layer and the task service.
//!
//! These tests verify owner scoping and subtask synchronization using an
//! in-memory SQLite database. Tests are organized by operation.

use serde_json::json;
use std::sync::Arc;
use taskboard::db::Database;
use taskboard::error::{ApiError, ErrorCode};
use taskboard::service::TaskService;
use taskboard::types::{SubtaskInput, TaskInput, UserId};

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn setup_service() -> TaskService {
    TaskService::new(Arc::new(setup_db()))
}

fn error_code(err: anyhow::Error) -> ErrorCode {
    ApiError::from(err).code
}

mod create_tests {
    use super::*;

    #[test]
    fn create_task_with_subtasks() {
        let db = setup_db();
        let input = TaskInput::new("Buy groceries")
            .with_subtasks(vec![SubtaskInput::new("Milk"), SubtaskInput::new("Eggs")]);

        let task = db.create_task(ALICE, &input).expect("Failed to create task");

        assert!(task.id > 0);
        assert_eq!(task.user_id, ALICE);
        assert_eq!(task.title, "Buy groceries");
        assert!(task.created_at > 0);
        assert_eq!(task.created_at, task.updated_at);

        let titles: Vec<&str> = task.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Milk", "Eggs"]);
        assert!(task.subtasks.iter().all(|s| !s.is_completed));
        assert!(task.subtasks.iter().all(|s| s.task_id == task.id));
    }

    #[test]
    fn create_stores_every_scalar_field() {
        let service = setup_service();

        let task = service
            .create(
                ALICE,
                &json!({
                    "title": "Dentist",
                    "description": "Annual checkup",
                    "category": "health",
                    "label": "appointments",
                    "priority": "high",
                    "due_date": "2024-06-01",
                    "reminder": "2024-05-31"
                }),
            )
            .unwrap();

        let stored = service.show(ALICE, task.id).unwrap();
        assert_eq!(stored, task);
        assert_eq!(stored.description.as_deref(), Some("Annual checkup"));
        assert_eq!(stored.category.as_deref(), Some("health"));
        assert_eq!(stored.label.as_deref(), Some("appointments"));
        assert_eq!(stored.priority.as_deref(), Some("high"));
        assert_eq!(stored.due_date.unwrap().to_string(), "2024-06-01");
        assert_eq!(stored.reminder.unwrap().to_string(), "2024-05-31");
        assert!(stored.subtasks.is_empty());
    }

    #[test]
    fn create_ignores_subtask_ids() {
        let db = setup_db();
        let first = db
            .create_task(ALICE, &TaskInput::new("first").with_subtasks(vec![SubtaskInput::new("a")]))
            .unwrap();
        let existing_id = first.subtasks[0].id;

        let second = db
            .create_task(
                ALICE,
                &TaskInput::new("second").with_subtasks(vec![SubtaskInput::existing(existing_id, "b")]),
            )
            .unwrap();

        assert_eq!(second.subtasks.len(), 1);
        assert_ne!(second.subtasks[0].id, existing_id);
        assert_eq!(second.subtasks[0].title, "b");

        // The original subtask is untouched
        let first = db.get_task(ALICE, first.id).unwrap();
        assert_eq!(first.subtasks[0].title, "a");
    }

    #[test]
    fn create_rejects_invalid_payload_without_writing() {
        let service = setup_service();

        let err = service
            .create(ALICE, &json!({"subtasks": [{"title": "orphan"}]}))
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(service.list(ALICE).unwrap().is_empty());
    }
}

mod list_tests {
    use super::*;

    #[test]
    fn list_only_returns_callers_tasks() {
        let db = setup_db();
        db.create_task(ALICE, &TaskInput::new("alice 1")).unwrap();
        db.create_task(BOB, &TaskInput::new("bob 1")).unwrap();
        db.create_task(ALICE, &TaskInput::new("alice 2")).unwrap();

        let tasks = db.list_tasks(ALICE).unwrap();

        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.user_id == ALICE));

        let bobs = db.list_tasks(BOB).unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].title, "bob 1");
    }

    #[test]
    fn list_attaches_subtasks_to_their_own_task() {
        let db = setup_db();
        let a = db
            .create_task(
                ALICE,
                &TaskInput::new("a").with_subtasks(vec![SubtaskInput::new("a1"), SubtaskInput::new("a2")]),
            )
            .unwrap();
        let b = db
            .create_task(ALICE, &TaskInput::new("b").with_subtasks(vec![SubtaskInput::new("b1")]))
            .unwrap();
        let c = db.create_task(ALICE, &TaskInput::new("c")).unwrap();

        let tasks = db.list_tasks(ALICE).unwrap();

        let find = |id| tasks.iter().find(|t| t.id == id).unwrap();
        assert_eq!(find(a.id).subtasks.len(), 2);
        assert_eq!(find(b.id).subtasks.len(), 1);
        assert_eq!(find(b.id).subtasks[0].title, "b1");
        assert!(find(c.id).subtasks.is_empty());
    }

    #[test]
    fn list_for_user_without_tasks_is_empty() {
        let db = setup_db();
        db.create_task(ALICE, &TaskInput::new("mine")).unwrap();

        assert!(db.list_tasks(BOB).unwrap().is_empty());
    }
}

mod show_tests {
    use super::*;

    #[test]
    fn show_unknown_task_is_not_found() {
        let db = setup_db();

        let err = db.get_task(ALICE, 999).unwrap_err();

        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
    }

    #[test]
    fn show_other_users_task_is_not_found() {
        let db = setup_db();
        let task = db.create_task(ALICE, &TaskInput::new("private")).unwrap();

        let err = ApiError::from(db.get_task(BOB, task.id).unwrap_err());

        assert_eq!(err.code, ErrorCode::TaskNotFound);
        // Same message as a task that never existed
        assert_eq!(err.message, format!("Task not found: {}", task.id));
        assert!(!err.message.contains("private"));
    }
}

mod update_tests {
    use super::*;

    #[test]
    fn update_replaces_all_scalar_fields() {
        let service = setup_service();
        let task = service
            .create(
                ALICE,
                &json!({
                    "title": "Original",
                    "description": "keep me?",
                    "category": "work",
                    "priority": "low",
                    "due_date": "2024-01-01"
                }),
            )
            .unwrap();

        let updated = service
            .update(ALICE, task.id, &json!({"title": "Renamed", "label": "new"}))
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.label.as_deref(), Some("new"));
        assert!(updated.description.is_none());
        assert!(updated.category.is_none());
        assert!(updated.priority.is_none());
        assert!(updated.due_date.is_none());
        assert!(updated.updated_at >= task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[test]
    fn update_retitles_listed_subtask_only() {
        let db = setup_db();
        let task = db
            .create_task(
                ALICE,
                &TaskInput::new("Trip").with_subtasks(vec![
                    SubtaskInput::new("Book hotel"),
                    SubtaskInput::new("Pack"),
                ]),
            )
            .unwrap();
        let hotel = task.subtasks[0].id;

        let updated = db
            .update_task(
                ALICE,
                task.id,
                &TaskInput::new("Renamed").with_subtasks(vec![SubtaskInput::existing(hotel, "Updated")]),
            )
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.subtasks.len(), 2);
        assert_eq!(updated.subtasks[0].id, hotel);
        assert_eq!(updated.subtasks[0].title, "Updated");
        assert_eq!(updated.subtasks[1].title, "Pack");
    }

    #[test]
    fn update_appends_new_subtasks() {
        let db = setup_db();
        let task = db
            .create_task(ALICE, &TaskInput::new("t").with_subtasks(vec![SubtaskInput::new("old")]))
            .unwrap();

        let updated = db
            .update_task(
                ALICE,
                task.id,
                &TaskInput::new("t").with_subtasks(vec![SubtaskInput::new("new")]),
            )
            .unwrap();

        let titles: Vec<&str> = updated.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["old", "new"]);
    }

    #[test]
    fn update_without_subtasks_leaves_them_untouched() {
        let db = setup_db();
        let task = db
            .create_task(
                ALICE,
                &TaskInput::new("t").with_subtasks(vec![SubtaskInput::new("a"), SubtaskInput::new("b")]),
            )
            .unwrap();

        let updated = db.update_task(ALICE, task.id, &TaskInput::new("t2")).unwrap();

        assert_eq!(updated.subtasks, task.subtasks);
    }

    #[test]
    fn update_with_empty_subtask_list_deletes_nothing() {
        let db = setup_db();
        let task = db
            .create_task(ALICE, &TaskInput::new("t").with_subtasks(vec![SubtaskInput::new("a")]))
            .unwrap();

        let updated = db
            .update_task(ALICE, task.id, &TaskInput::new("t").with_subtasks(vec![]))
            .unwrap();

        assert_eq!(updated.subtasks.len(), 1);
    }

    #[test]
    fn update_with_unknown_subtask_id_fails_and_rolls_back() {
        let db = setup_db();
        let task = db
            .create_task(ALICE, &TaskInput::new("Before").with_subtasks(vec![SubtaskInput::new("a")]))
            .unwrap();

        let err = db
            .update_task(
                ALICE,
                task.id,
                &TaskInput::new("After").with_subtasks(vec![
                    SubtaskInput::new("would be added"),
                    SubtaskInput::existing(4242, "ghost"),
                ]),
            )
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::SubtaskNotFound);

        let stored = db.get_task(ALICE, task.id).unwrap();
        assert_eq!(stored.title, "Before");
        assert_eq!(stored.subtasks, task.subtasks);
    }

    #[test]
    fn update_cannot_touch_subtask_of_another_task() {
        let db = setup_db();
        let mine = db.create_task(ALICE, &TaskInput::new("mine")).unwrap();
        let other = db
            .create_task(ALICE, &TaskInput::new("other").with_subtasks(vec![SubtaskInput::new("keep")]))
            .unwrap();
        let foreign = other.subtasks[0].id;

        let err = db
            .update_task(
                ALICE,
                mine.id,
                &TaskInput::new("mine").with_subtasks(vec![SubtaskInput::existing(foreign, "stolen")]),
            )
            .unwrap_err();

        assert_eq!(error_code(err), ErrorCode::SubtaskNotFound);
        assert_eq!(db.find_subtask(other.id, foreign).unwrap().title, "keep");
    }

    #[test]
    fn update_other_users_task_is_not_found() {
        let db = setup_db();
        let task = db.create_task(ALICE, &TaskInput::new("alice")).unwrap();

        let err = db.update_task(BOB, task.id, &TaskInput::new("hijack")).unwrap_err();

        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
        assert_eq!(db.get_task(ALICE, task.id).unwrap().title, "alice");
    }

    #[test]
    fn update_validates_before_lookup() {
        let service = setup_service();

        let err = service.update(ALICE, 999, &json!({"title": ""})).unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }
}

mod delete_tests {
    use super::*;

    #[test]
    fn delete_removes_task_and_subtasks() {
        let db = setup_db();
        let task = db
            .create_task(
                ALICE,
                &TaskInput::new("t").with_subtasks(vec![SubtaskInput::new("a"), SubtaskInput::new("b")]),
            )
            .unwrap();
        let subtask_id = task.subtasks[0].id;

        let removed = db.delete_task(ALICE, task.id).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(
            error_code(db.get_task(ALICE, task.id).unwrap_err()),
            ErrorCode::TaskNotFound
        );
        assert_eq!(
            error_code(db.find_subtask(task.id, subtask_id).unwrap_err()),
            ErrorCode::SubtaskNotFound
        );
        assert!(db.list_subtasks(task.id).unwrap().is_empty());
    }

    #[test]
    fn delete_task_without_subtasks() {
        let service = setup_service();
        let task = service.create(ALICE, &json!({"title": "solo"})).unwrap();

        let confirmation = service.delete(ALICE, task.id).unwrap();

        assert_eq!(confirmation.message, "Task deleted successfully");
        assert!(service.list(ALICE).unwrap().is_empty());
    }

    #[test]
    fn delete_other_users_task_is_not_found() {
        let db = setup_db();
        let task = db
            .create_task(ALICE, &TaskInput::new("t").with_subtasks(vec![SubtaskInput::new("a")]))
            .unwrap();

        let err = db.delete_task(BOB, task.id).unwrap_err();

        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
        assert_eq!(db.get_task(ALICE, task.id).unwrap().subtasks.len(), 1);
    }

    #[test]
    fn delete_twice_is_not_found() {
        let db = setup_db();
        let task = db.create_task(ALICE, &TaskInput::new("t")).unwrap();

        db.delete_task(ALICE, task.id).unwrap();
        let err = db.delete_task(ALICE, task.id).unwrap_err();

        assert_eq!(error_code(err), ErrorCode::TaskNotFound);
    }

    #[test]
    fn delete_leaves_other_tasks_subtasks() {
        let db = setup_db();
        let doomed = db
            .create_task(ALICE, &TaskInput::new("doomed").with_subtasks(vec![SubtaskInput::new("x")]))
            .unwrap();
        let kept = db
            .create_task(ALICE, &TaskInput::new("kept").with_subtasks(vec![SubtaskInput::new("y")]))
            .unwrap();

        db.delete_task(ALICE, doomed.id).unwrap();

        assert_eq!(db.list_subtasks(kept.id).unwrap().len(), 1);
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.db");

        let task_id = {
            let db = Database::open(&path).unwrap();
            db.create_task(ALICE, &TaskInput::new("durable").with_subtasks(vec![SubtaskInput::new("s")]))
                .unwrap()
                .id
        };

        let db = Database::open(&path).unwrap();
        let task = db.get_task(ALICE, task_id).unwrap();
        assert_eq!(task.title, "durable");
        assert_eq!(task.subtasks.len(), 1);
    }

    #[test]
    fn subtask_foreign_key_is_enforced() {
        let db = setup_db();

        let result = db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO subtasks (task_id, title, is_completed, created_at, updated_at)
                 VALUES (12345, 'dangling', 0, 0, 0)",
                [],
            )?;
            Ok(())
        });

        assert!(result.is_err());
    }
}
