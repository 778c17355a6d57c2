//! `PostgreSQL` task store.
//!
//! Tasks are stored as JSONB documents keyed by UUID, which gives the
//! collection semantics the API expects: partial updates are a JSONB merge
//! (`data || patch`) and filters/sorts read fields out of the document.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     seq  BIGSERIAL,
//!     id   UUID PRIMARY KEY,
//!     data JSONB NOT NULL
//! );
//! CREATE INDEX idx_tasks_due_date ON tasks ((data->>'dueDate'));
//! ```
//!
//! `seq` records insertion order and breaks ties so that pages are stable.
//!
//! The pool is created once at startup and shared by every request. No
//! operation closes it; [`PostgresTaskStore::close`] is only called on
//! shutdown.

use futures::future::BoxFuture;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Task, TaskDocument, TaskId, TaskPatch};
use crate::infrastructure::{
    DeleteResult, InsertOneResult, RepositoryError, SortDirection, TaskQuery, TaskSort, TaskStore,
    UpdateResult,
};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tasks (\
     seq BIGSERIAL, \
     id UUID PRIMARY KEY, \
     data JSONB NOT NULL)";

const CREATE_DUE_DATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks ((data->>'dueDate'))";

const UPDATE_MERGE: &str = "WITH previous AS ( \
         SELECT id, data FROM tasks WHERE id = $2 FOR UPDATE \
     ) \
     UPDATE tasks SET data = previous.data || $1 \
     FROM previous \
     WHERE tasks.id = previous.id \
     RETURNING previous.data IS DISTINCT FROM tasks.data";

// =============================================================================
// SQL Building
// =============================================================================

/// SQL expression that orders by the given sort.
///
/// Field names come from a closed enum, never from request text.
fn order_expression(sort: TaskSort) -> String {
    let column = match sort.field.document_field() {
        "completed" => "(data->>'completed')::boolean".to_string(),
        field => format!("data->>'{field}'"),
    };
    let direction = match sort.direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    };
    format!("{column} {direction}")
}

/// Builds the list statement for a query.
///
/// Binds: `$1` completed filter (nullable), `$2` limit (nullable means
/// unlimited), `$3` offset.
fn build_find_sql(query: &TaskQuery) -> String {
    let order = query.sort.map_or_else(
        || "seq ASC".to_string(),
        |sort| format!("{}, seq ASC", order_expression(sort)),
    );

    format!(
        "SELECT id, data FROM tasks \
         WHERE ($1::boolean IS NULL OR (data->>'completed')::boolean = $1) \
         ORDER BY {order} \
         LIMIT $2 OFFSET $3"
    )
}

fn database_error(error: &sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

fn serialization_error(error: &serde_json::Error) -> RepositoryError {
    RepositoryError::SerializationError(error.to_string())
}

fn decode_row(id: Uuid, data: serde_json::Value) -> Result<Task, RepositoryError> {
    let document: TaskDocument =
        serde_json::from_value(data).map_err(|error| serialization_error(&error))?;
    Ok(Task::from_document(TaskId::from_uuid(id), document))
}

// =============================================================================
// PostgreSQL Task Store
// =============================================================================

/// `PostgreSQL` implementation of [`TaskStore`].
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    /// Connection pool for `PostgreSQL`.
    pool: PgPool,
}

impl PostgresTaskStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the table and index if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DatabaseError` if either statement fails.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        for statement in [CREATE_TABLE, CREATE_DUE_DATE_INDEX] {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|error| database_error(&error))?;
        }
        Ok(())
    }

    /// Closes the pool. Only call this during shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl TaskStore for PostgresTaskStore {
    fn find(&self, query: TaskQuery) -> BoxFuture<'static, Result<Vec<Task>, RepositoryError>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let sql = build_find_sql(&query);
            let limit = query
                .limit
                .map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
            let offset = i64::try_from(query.skip).unwrap_or(i64::MAX);

            let rows: Vec<(Uuid, serde_json::Value)> = sqlx::query_as(&sql)
                .bind(query.filter.completed)
                .bind(limit)
                .bind(offset)
                .fetch_all(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            rows.into_iter()
                .map(|(id, data)| decode_row(id, data))
                .collect()
        })
    }

    fn insert_one(
        &self,
        document: TaskDocument,
    ) -> BoxFuture<'static, Result<InsertOneResult, RepositoryError>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let id = TaskId::generate();
            let data = serde_json::to_value(&document).map_err(|error| serialization_error(&error))?;

            sqlx::query("INSERT INTO tasks (id, data) VALUES ($1, $2)")
                .bind(id.as_uuid())
                .bind(&data)
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(InsertOneResult::new(id))
        })
    }

    fn find_one(&self, id: TaskId) -> BoxFuture<'static, Result<Option<Task>, RepositoryError>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: Option<(Uuid, serde_json::Value)> =
                sqlx::query_as("SELECT id, data FROM tasks WHERE id = $1")
                    .bind(id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(|error| database_error(&error))?;

            row.map(|(id, data)| decode_row(id, data)).transpose()
        })
    }

    fn update_one(
        &self,
        id: TaskId,
        patch: TaskPatch,
    ) -> BoxFuture<'static, Result<UpdateResult, RepositoryError>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let fragment = serde_json::to_value(&patch).map_err(|error| serialization_error(&error))?;

            let modified: Option<(bool,)> = sqlx::query_as(UPDATE_MERGE)
                .bind(&fragment)
                .bind(id.as_uuid())
                .fetch_optional(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(modified.map_or_else(
                || UpdateResult::new(0, 0),
                |(modified,)| UpdateResult::new(1, u64::from(modified)),
            ))
        })
    }

    fn delete_one(&self, id: TaskId) -> BoxFuture<'static, Result<DeleteResult, RepositoryError>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(DeleteResult::new(result.rows_affected()))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{SortField, TaskFilter};
    use rstest::rstest;

    #[rstest]
    fn test_find_sql_without_sort_uses_insertion_order() {
        let sql = build_find_sql(&TaskQuery::default());
        assert!(sql.contains("ORDER BY seq ASC"));
        assert!(sql.contains("LIMIT $2 OFFSET $3"));
    }

    #[rstest]
    #[case(SortField::DueDate, SortDirection::Ascending, "ORDER BY data->>'dueDate' ASC, seq ASC")]
    #[case(
        SortField::Status,
        SortDirection::Descending,
        "ORDER BY (data->>'completed')::boolean DESC, seq ASC"
    )]
    fn test_find_sql_orders_by_document_field(
        #[case] field: SortField,
        #[case] direction: SortDirection,
        #[case] expected: &str,
    ) {
        let query = TaskQuery {
            filter: TaskFilter::default(),
            sort: Some(TaskSort { field, direction }),
            skip: 0,
            limit: None,
        };
        assert!(build_find_sql(&query).contains(expected));
    }

    #[rstest]
    fn test_decode_row_rejects_malformed_document() {
        let result = decode_row(Uuid::now_v7(), serde_json::json!({"title": 5}));
        assert!(matches!(result, Err(RepositoryError::SerializationError(_))));
    }

    #[rstest]
    fn test_decode_row_reads_document() {
        let id = Uuid::now_v7();
        let task = decode_row(
            id,
            serde_json::json!({
                "title": "A",
                "dueDate": "2025-01-01T00:00:00.000Z",
                "completed": false
            }),
        )
        .unwrap();
        assert_eq!(task.id, TaskId::from_uuid(id));
        assert_eq!(task.title, "A");
        assert!(task.description.is_none());
    }
}
