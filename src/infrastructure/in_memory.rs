//! In-memory task store.
//!
//! Keeps documents in insertion order behind an async `RwLock`, so an
//! unsorted read returns the store's natural order the way a document
//! collection does. Suitable for development and tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::{Task, TaskDocument, TaskId, TaskPatch};
use crate::infrastructure::{
    DeleteResult, InsertOneResult, RepositoryError, TaskQuery, TaskStore, UpdateResult,
};

/// In-memory implementation of [`TaskStore`].
///
/// Clones share the same underlying collection.
///
/// # Example
///
/// ```ignore
/// let store = InMemoryTaskStore::new();
/// let ack = store.insert_one(document).await?;
/// let found = store.find_one(ack.inserted_id).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with tasks, kept in the given order.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
        }
    }
}

/// Applies filter, sort, skip and limit to a snapshot of the collection.
fn run_query(tasks: &[Task], query: TaskQuery) -> Vec<Task> {
    let mut matching: Vec<Task> = tasks
        .iter()
        .filter(|task| query.filter.matches(task))
        .cloned()
        .collect();

    // Stable: ties keep insertion order.
    if let Some(sort) = query.sort {
        matching.sort_by(|left, right| sort.compare(left, right));
    }

    let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
    let limit = query
        .limit
        .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

    matching.into_iter().skip(skip).take(limit).collect()
}

#[allow(clippy::significant_drop_tightening)]
impl TaskStore for InMemoryTaskStore {
    fn find(&self, query: TaskQuery) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            let guard = tasks.read().await;
            Ok(run_query(&guard, query))
        })
    }

    fn insert_one(
        &self,
        document: TaskDocument,
    ) -> BoxFuture<'static, Result<InsertOneResult, RepositoryError>> {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            let id = TaskId::generate();
            tasks.write().await.push(Task::from_document(id, document));
            Ok(InsertOneResult::new(id))
        })
    }

    fn find_one(&self, id: TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            let guard = tasks.read().await;
            Ok(guard.iter().find(|task| task.id == id).cloned())
        })
    }

    fn update_one(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<UpdateResult, RepositoryError>> {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            let mut guard = tasks.write().await;
            let Some(existing) = guard.iter_mut().find(|task| task.id == id) else {
                return Ok(UpdateResult::new(0, 0));
            };

            let updated = patch.apply(existing);
            let modified = u64::from(updated != *existing);
            *existing = updated;
            Ok(UpdateResult::new(1, modified))
        })
    }

    fn delete_one(&self, id: TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>> {
        let tasks = Arc::clone(&self.tasks);
        Box::pin(async move {
            let mut guard = tasks.write().await;
            let before = guard.len();
            guard.retain(|task| task.id != id);
            Ok(DeleteResult::new(u64::from(guard.len() != before)))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DueDate;
    use crate::infrastructure::{SortDirection, SortField, TaskFilter, TaskSort};
    use rstest::{fixture, rstest};

    fn document(title: &str, due: &str, completed: bool) -> TaskDocument {
        TaskDocument::new(title, DueDate::parse(due).unwrap()).with_completed(completed)
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.title.as_str()).collect()
    }

    #[fixture]
    async fn seeded() -> InMemoryTaskStore {
        let store = InMemoryTaskStore::new();
        for (title, due, completed) in [
            ("c", "2025-03-01", false),
            ("a", "2025-01-01", true),
            ("d", "2025-04-01", true),
            ("b", "2025-02-01", false),
        ] {
            store
                .insert_one(document(title, due, completed))
                .await
                .unwrap();
        }
        store
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_without_sort_keeps_insertion_order(
        #[future] seeded: InMemoryTaskStore,
    ) {
        let store = seeded.await;
        let tasks = store.find(TaskQuery::default()).await.unwrap();
        assert_eq!(titles(&tasks), ["c", "a", "d", "b"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_filters_sorts_and_pages(#[future] seeded: InMemoryTaskStore) {
        let store = seeded.await;
        let query = TaskQuery {
            filter: TaskFilter::default(),
            sort: Some(TaskSort {
                field: SortField::DueDate,
                direction: SortDirection::Descending,
            }),
            skip: 1,
            limit: Some(2),
        };

        let tasks = store.find(query).await.unwrap();
        assert_eq!(titles(&tasks), ["c", "b"]);

        let completed_only = TaskQuery {
            filter: TaskFilter {
                completed: Some(true),
            },
            ..TaskQuery::default()
        };
        let tasks = store.find(completed_only).await.unwrap();
        assert_eq!(titles(&tasks), ["a", "d"]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_find_skip_past_end_is_empty(#[future] seeded: InMemoryTaskStore) {
        let store = seeded.await;
        let query = TaskQuery {
            skip: 10,
            limit: Some(5),
            ..TaskQuery::default()
        };
        assert!(store.find(query).await.unwrap().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn test_insert_then_find_one() {
        let store = InMemoryTaskStore::new();
        let ack = store
            .insert_one(document("A", "2025-01-01", false))
            .await
            .unwrap();

        assert!(ack.acknowledged);
        let found = store.find_one(ack.inserted_id).await.unwrap().unwrap();
        assert_eq!(found.title, "A");
        assert!(store.find_one(TaskId::generate()).await.unwrap().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_one_reports_matched_and_modified() {
        let store = InMemoryTaskStore::new();
        let ack = store
            .insert_one(document("A", "2025-01-01", false))
            .await
            .unwrap();
        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };

        let first = store.update_one(ack.inserted_id, patch.clone()).await.unwrap();
        assert_eq!((first.matched_count, first.modified_count), (1, 1));

        let repeat = store.update_one(ack.inserted_id, patch.clone()).await.unwrap();
        assert_eq!((repeat.matched_count, repeat.modified_count), (1, 0));

        let missing = store.update_one(TaskId::generate(), patch).await.unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn test_delete_one_is_permanent() {
        let store = InMemoryTaskStore::new();
        let ack = store
            .insert_one(document("A", "2025-01-01", false))
            .await
            .unwrap();

        assert_eq!(store.delete_one(ack.inserted_id).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete_one(ack.inserted_id).await.unwrap().deleted_count, 0);
        assert!(store.find_one(ack.inserted_id).await.unwrap().is_none());
    }
}
