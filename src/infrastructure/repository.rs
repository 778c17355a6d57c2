//! Store traits for domain entities.
//!
//! The task store mirrors a document database collection: filtered and
//! sorted reads with skip/limit, single-document insert, lookup, merge
//! update and delete. Every method returns a boxed `'static` future so the
//! traits stay object-safe and handlers can hold `Arc<dyn TaskStore>`.

use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Task, TaskDocument, TaskId, TaskPatch, User};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backend rejected or failed the operation.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// No connection to the backend could be obtained.
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

// =============================================================================
// Query Types
// =============================================================================

/// Equality predicate over the stored tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks whose `completed` flag equals this value.
    pub completed: Option<bool>,
}

impl TaskFilter {
    /// Returns true when the task satisfies the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.completed.is_none_or(|completed| task.completed == completed)
    }
}

/// Fields a list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortField {
    /// Orders by `dueDate`.
    #[serde(rename = "dueDate")]
    DueDate,
    /// Orders by the completion flag (`false` before `true` ascending).
    #[serde(rename = "status")]
    Status,
}

impl SortField {
    /// Resolves a field name from the allow-list.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dueDate" => Some(Self::DueDate),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// Name of the stored document field this sort reads.
    #[must_use]
    pub const fn document_field(self) -> &'static str {
        match self {
            Self::DueDate => "dueDate",
            Self::Status => "completed",
        }
    }
}

/// Sort direction, written `1` / `-1` on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Maps `1` and `-1` to a direction; anything else is `None`.
    #[must_use]
    pub const fn from_order(order: i64) -> Option<Self> {
        match order {
            1 => Some(Self::Ascending),
            -1 => Some(Self::Descending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_order(self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// A single-field ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl TaskSort {
    /// Compares two tasks according to this ordering.
    #[must_use]
    pub fn compare(&self, left: &Task, right: &Task) -> std::cmp::Ordering {
        let ordering = match self.field {
            SortField::DueDate => left.due_date.cmp(&right.due_date),
            SortField::Status => left.completed.cmp(&right.completed),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A fully resolved read against the task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub sort: Option<TaskSort>,
    /// Number of matching documents to skip.
    pub skip: u64,
    /// Maximum number of documents to return; `None` returns all.
    pub limit: Option<u64>,
}

// =============================================================================
// Acknowledgements
// =============================================================================

/// Result of inserting one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: TaskId,
}

impl InsertOneResult {
    #[must_use]
    pub const fn new(inserted_id: TaskId) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Result of a merge update against one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    #[must_use]
    pub const fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

/// Result of deleting one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    #[must_use]
    pub const fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

// =============================================================================
// Task Store
// =============================================================================

/// Document-collection contract for tasks.
///
/// Implementations share one connection pool across all calls and must
/// never tear it down from inside an operation.
pub trait TaskStore: Send + Sync {
    /// Returns the tasks matching the filter, ordered, then skipped and limited.
    fn find(&self, query: TaskQuery) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>>;

    /// Inserts a new document; the store assigns the identifier.
    fn insert_one(
        &self,
        document: TaskDocument,
    ) -> BoxFuture<'static, Result<InsertOneResult, RepositoryError>>;

    /// Finds a task by its identifier.
    fn find_one(&self, id: TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>>;

    /// Merges the supplied fields into the task with this identifier.
    fn update_one(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<UpdateResult, RepositoryError>>;

    /// Permanently removes the task with this identifier.
    fn delete_one(&self, id: TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>>;
}

// =============================================================================
// Credential Store
// =============================================================================

/// Lookup of login identities.
pub trait CredentialStore: Send + Sync {
    /// Finds a user by exact username.
    fn find_by_username(
        &self,
        username: &str,
    ) -> BoxFuture<'static, Result<Option<User>, RepositoryError>>;
}

// =============================================================================
// Tests
// =============================================================================
