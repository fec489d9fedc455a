//! Payload validation for task create/update requests.
//!
//! Works on the raw JSON body so that type errors can be reported per field
//! instead of failing the whole deserialization.

use crate::error::{ApiError, ApiResult};
use crate::types::{SubtaskInput, TaskInput};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

/// Maximum length (in characters) of titles and short string columns.
pub const MAX_STRING_LEN: usize = 255;

/// Collected `(field, message)` pairs, in discovery order.
#[derive(Debug, Default)]
struct Violations(Vec<(String, String)>);

impl Violations {
    fn add(&mut self, field: &str, message: String) {
        self.0.push((field.to_string(), message));
    }

    fn into_result<T>(self, value: T) -> ApiResult<T> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::validation(self.0))
        }
    }
}

/// Validate a create/update payload into a [`TaskInput`].
///
/// Strings are trimmed and empty strings count as null. Keys outside the
/// task schema are ignored.
pub fn validate_task_payload(payload: &Value) -> ApiResult<TaskInput> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::bad_request("The request body must be a JSON object."))?;

    let mut violations = Violations::default();

    let title = required_string(obj, "title", "title", &mut violations);
    let description = optional_string(obj, "description", None, &mut violations);
    let category = optional_string(obj, "category", Some(MAX_STRING_LEN), &mut violations);
    let label = optional_string(obj, "label", Some(MAX_STRING_LEN), &mut violations);
    let priority = optional_string(obj, "priority", Some(MAX_STRING_LEN), &mut violations);
    let due_date = optional_date(obj, "due_date", &mut violations);
    let reminder = optional_date(obj, "reminder", &mut violations);
    let subtasks = subtask_list(obj, &mut violations);

    violations.into_result(TaskInput {
        title: title.unwrap_or_default(),
        description,
        category,
        label,
        priority,
        due_date,
        reminder,
        subtasks,
    })
}

/// Parse a calendar date from `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or an
/// RFC 3339 timestamp. Any time part is dropped.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Look up a key, folding null and blank strings into `None`.
fn present<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn required_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    violations: &mut Violations,
) -> Option<String> {
    match present(obj, key) {
        None => {
            violations.add(path, format!("The {} field is required.", path));
            None
        }
        Some(value) => checked_string(value, path, Some(MAX_STRING_LEN), violations),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    max_len: Option<usize>,
    violations: &mut Violations,
) -> Option<String> {
    present(obj, key).and_then(|value| checked_string(value, key, max_len, violations))
}

fn checked_string(
    value: &Value,
    path: &str,
    max_len: Option<usize>,
    violations: &mut Violations,
) -> Option<String> {
    let Some(s) = value.as_str() else {
        violations.add(path, format!("The {} field must be a string.", path));
        return None;
    };

    let s = s.trim();
    if let Some(max) = max_len
        && s.chars().count() > max
    {
        violations.add(
            path,
            format!(
                "The {} field must not be greater than {} characters.",
                path, max
            ),
        );
        return None;
    }

    Some(s.to_string())
}

fn optional_date(
    obj: &Map<String, Value>,
    key: &str,
    violations: &mut Violations,
) -> Option<NaiveDate> {
    let value = present(obj, key)?;
    let parsed = value.as_str().and_then(|s| parse_date(s.trim()));
    if parsed.is_none() {
        violations.add(key, format!("The {} field must be a valid date.", key));
    }
    parsed
}

fn subtask_list(
    obj: &Map<String, Value>,
    violations: &mut Violations,
) -> Option<Vec<SubtaskInput>> {
    let value = match obj.get("subtasks") {
        None | Some(Value::Null) => return None,
        Some(v) => v,
    };

    let Some(entries) = value.as_array() else {
        violations.add("subtasks", "The subtasks field must be an array.".to_string());
        return None;
    };

    let mut subtasks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let prefix = format!("subtasks.{}", index);

        let Some(entry) = entry.as_object() else {
            violations.add(&prefix, format!("The {} field must be an object.", prefix));
            continue;
        };

        let title = required_string(entry, "title", &format!("{}.title", prefix), violations);
        let id = subtask_id(entry, &prefix, violations);

        if let Some(title) = title {
            subtasks.push(SubtaskInput { id, title });
        }
    }

    Some(subtasks)
}

fn subtask_id(entry: &Map<String, Value>, prefix: &str, violations: &mut Violations) -> Option<i64> {
    match entry.get("id") {
        None | Some(Value::Null) => None,
        Some(value) => match id_value(value) {
            Some(id) if id > 0 => Some(id),
            _ => {
                let path = format!("{}.id", prefix);
                violations.add(
                    &path,
                    format!("The {} field must be a positive integer.", path),
                );
                None
            }
        },
    }
}

/// Ids may arrive as JSON numbers or numeric strings.
fn id_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
