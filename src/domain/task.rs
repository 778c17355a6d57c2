//! Task domain model.
//!
//! A task is a document owned by the record store. The store assigns the
//! identifier, the API supplies everything else. Updates are partial: a
//! [`TaskPatch`] only carries the fields a caller actually sent.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task.
///
/// Assigned by the store on insert and stable for the lifetime of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parses an identifier received on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTaskId`] when the input is not a syntactically valid
    /// store identifier.
    pub fn parse(input: &str) -> Result<Self, InvalidTaskId> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| InvalidTaskId(input.to_string()))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// The path segment could not be read as a task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid task identifier: {0:?}")]
pub struct InvalidTaskId(pub String);

/// The date a task is due, always held in UTC.
///
/// Serialized as RFC 3339 with millisecond precision and a `Z` suffix,
/// e.g. `2025-01-01T00:00:00.000Z`. Fixed-width output keeps lexicographic
/// and chronological order identical, which the document store relies on
/// when sorting. The year is held to `0000..=9999` so the output stays four
/// digits wide and parses back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DueDate(DateTime<Utc>);

const WIRE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

impl DueDate {
    /// Creates a `DueDate` from a `DateTime<Utc>`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDueDate`] when the year falls outside `0000..=9999`.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Result<Self, InvalidDueDate> {
        if WIRE_YEARS.contains(&datetime.year()) {
            Ok(Self(datetime))
        } else {
            Err(InvalidDueDate(datetime.to_rfc3339()))
        }
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parses a textual date.
    ///
    /// Accepted forms, tried in order:
    /// - RFC 3339 with offset (`2025-01-01T10:00:00+02:00`)
    /// - date only (`2025-01-01`), read as midnight UTC
    /// - date and time without offset (`2025-01-01T10:00:00`,
    ///   `2025-01-01 10:00:00`), read as UTC
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDueDate`] when none of the forms match or the year
    /// falls outside `0000..=9999`.
    pub fn parse(input: &str) -> Result<Self, InvalidDueDate> {
        let trimmed = input.trim();

        let datetime = if let Ok(datetime) = DateTime::parse_from_rfc3339(trimmed) {
            Some(datetime.with_timezone(&Utc))
        } else if let Some(midnight) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        {
            Some(Utc.from_utc_datetime(&midnight))
        } else {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|naive| Utc.from_utc_datetime(&naive))
        };

        datetime
            .ok_or_else(|| InvalidDueDate(input.to_string()))
            .and_then(Self::from_datetime)
            .map_err(|_| InvalidDueDate(input.to_string()))
    }

    /// Builds a date from milliseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDueDate`] when the year falls outside `0000..=9999`.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, InvalidDueDate> {
        DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or_else(|| InvalidDueDate(millis.to_string()))
            .and_then(Self::from_datetime)
            .map_err(|_| InvalidDueDate(millis.to_string()))
    }

    /// Renders the canonical wire form.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl std::fmt::Display for DueDate {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.to_wire())
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// The supplied value is not a parseable date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date: {0:?}")]
pub struct InvalidDueDate(pub String);

// =============================================================================
// Task
// =============================================================================

/// The stored body of a task, without its identifier.
///
/// This is what gets inserted and what the document column holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    /// Never empty once persisted.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: DueDate,
    #[serde(default)]
    pub completed: bool,
}

impl TaskDocument {
    /// Creates a document for a new, not yet completed task.
    #[must_use]
    pub fn new(title: impl Into<String>, due_date: DueDate) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_date,
            completed: false,
        }
    }

    /// Returns the document with the given description.
    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    /// Returns the document with the given completion flag.
    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: DueDate,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Joins a store-assigned identifier with its document.
    #[must_use]
    pub fn from_document(id: TaskId, document: TaskDocument) -> Self {
        Self {
            id,
            title: document.title,
            description: document.description,
            due_date: document.due_date,
            completed: document.completed,
        }
    }

    /// Splits the identifier off, returning the stored body.
    #[must_use]
    pub fn into_document(self) -> (TaskId, TaskDocument) {
        (
            self.id,
            TaskDocument {
                title: self.title,
                description: self.description,
                due_date: self.due_date,
                completed: self.completed,
            },
        )
    }
}

// =============================================================================
// Partial Update
// =============================================================================

/// The set of fields a caller asked to change.
///
/// Fields left as `None` keep their stored value. Serializing a patch yields
/// exactly the supplied fields, which is the shape a document store merges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Returns true when no field was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.completed.is_none()
    }

    /// Merges the patch over a task, returning the updated task.
    #[must_use]
    pub fn apply(&self, task: &Task) -> Task {
        Task {
            id: task.id,
            title: self.title.clone().unwrap_or_else(|| task.title.clone()),
            description: self
                .description
                .clone()
                .or_else(|| task.description.clone()),
            due_date: self.due_date.unwrap_or(task.due_date),
            completed: self.completed.unwrap_or(task.completed),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
