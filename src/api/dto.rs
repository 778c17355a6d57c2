//! Data Transfer Objects for API requests and responses.
//!
//! Request DTOs accept every field as optional so that missing and malformed
//! input is reported with the API's own messages instead of a deserializer
//! error.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::TaskValidationError;
use super::query::ListTasksQuery;
use crate::domain::{DueDate, InvalidDueDate, Task, TaskDocument, TaskPatch};
use crate::infrastructure::{DeleteResult, InsertOneResult, UpdateResult};

/// Current time in the format used by every `timestamp` field.
#[must_use]
pub fn response_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Due Date Input
// =============================================================================

/// A due date as clients send it: a date string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DueDateInput {
    Text(String),
    EpochMillis(i64),
    /// Non-integer or out-of-`i64` numbers. The fraction is dropped.
    FractionalMillis(f64),
}

impl DueDateInput {
    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    /// Parses the input into a valid date.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDueDate`] when the value is not a recognizable date.
    pub fn resolve(&self) -> Result<DueDate, InvalidDueDate> {
        match self {
            Self::Text(text) => DueDate::parse(text),
            Self::EpochMillis(millis) => DueDate::from_epoch_millis(*millis),
            Self::FractionalMillis(millis) => fractional_millis(*millis)
                .ok_or_else(|| InvalidDueDate(millis.to_string()))
                .and_then(DueDate::from_epoch_millis),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn fractional_millis(millis: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    (millis.is_finite() && millis.abs() < LIMIT).then_some(millis.trunc() as i64)
}

// =============================================================================
// Task Requests
// =============================================================================

/// Body of `POST /Task`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DueDateInput>,
    /// Defaults to `false`.
    #[serde(default)]
    pub completed: Option<bool>,
}

impl CreateTaskRequest {
    /// Validates the request into a document ready for insertion.
    ///
    /// Empty strings count as missing.
    ///
    /// # Errors
    ///
    /// - `MissingRequiredFields` when `title` or `dueDate` is absent
    /// - `InvalidDateFormat` when `dueDate` does not parse
    pub fn into_document(self) -> Result<TaskDocument, TaskValidationError> {
        let title = self.title.filter(|title| !title.is_empty());
        let due_date = self.due_date.filter(|due_date| !due_date.is_blank());

        let (Some(title), Some(due_date)) = (title, due_date) else {
            return Err(TaskValidationError::MissingRequiredFields);
        };
        let due_date = due_date
            .resolve()
            .map_err(|_| TaskValidationError::InvalidDateFormat)?;

        Ok(TaskDocument {
            title,
            description: self.description,
            due_date,
            completed: self.completed.unwrap_or(false),
        })
    }
}

/// Body of `PUT /Task/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DueDateInput>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl UpdateTaskRequest {
    /// Builds a patch holding only the supplied fields.
    ///
    /// # Errors
    ///
    /// - `NoFieldsToUpdate` when nothing was supplied
    /// - `EmptyTitle` when `title` is the empty string
    /// - `InvalidDateFormat` when `dueDate` does not parse
    pub fn into_patch(self) -> Result<TaskPatch, TaskValidationError> {
        if self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
        {
            return Err(TaskValidationError::NoFieldsToUpdate);
        }

        if self.title.as_deref() == Some("") {
            return Err(TaskValidationError::EmptyTitle);
        }

        let due_date = self
            .due_date
            .map(|due_date| due_date.resolve())
            .transpose()
            .map_err(|_| TaskValidationError::InvalidDateFormat)?;

        Ok(TaskPatch {
            title: self.title,
            description: self.description,
            due_date,
            completed: self.completed,
        })
    }
}

// =============================================================================
// Task Responses
// =============================================================================

/// Body of `GET /Task`.
#[derive(Debug, Clone, Serialize)]
pub struct ListTasksResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
    /// The query parameters as received.
    pub query: ListTasksQuery,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Body of `POST /Task`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskResponse {
    pub success: bool,
    pub message: InsertOneResult,
}

/// Body of `GET /Task/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct GetTaskResponse {
    pub success: bool,
    pub task: Task,
    pub timestamp: String,
}

/// Body of `PUT /Task/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTaskResponse {
    pub success: bool,
    pub message: UpdateResult,
    pub timestamp: String,
}

/// Body of `DELETE /Task/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteTaskResponse {
    pub success: bool,
    pub message: String,
    pub result: DeleteResult,
    pub timestamp: String,
}

// =============================================================================
// Login
// =============================================================================

/// Body of `POST /login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

// =============================================================================
// Tests
// =============================================================================
