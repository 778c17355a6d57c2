//! HTTP handlers for the Task resource.
//!
//! Each handler validates its input, makes a single store call and shapes
//! the response. Mutating handlers take [`AuthenticatedUser`], so they are
//! only reached with a valid bearer token.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::dto::{
    CreateTaskRequest, CreateTaskResponse, DeleteTaskResponse, GetTaskResponse,
    UpdateTaskRequest, UpdateTaskResponse, response_timestamp,
};
use super::error::{ApiErrorResponse, TaskValidationError};
use crate::auth::{AuthenticatedUser, TokenService};
use crate::domain::TaskId;
use crate::infrastructure::{CredentialStore, TaskStore};

// =============================================================================
// Application Configuration
// =============================================================================

/// Runtime settings for the handlers.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Page size used when `page` is given without `limit`.
    pub default_page_limit: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 10,
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Stores are trait objects so the backend can be chosen at startup and
/// replaced with an in-memory one in tests.
#[derive(Clone)]
pub struct AppState {
    pub task_store: Arc<dyn TaskStore>,
    pub credential_store: Arc<dyn CredentialStore>,
    pub token_service: Arc<TokenService>,
    pub config: AppConfig,
}

impl AppState {
    #[must_use]
    pub fn new(
        task_store: Arc<dyn TaskStore>,
        credential_store: Arc<dyn CredentialStore>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            task_store,
            credential_store,
            token_service,
            config: AppConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(self, config: AppConfig) -> Self {
        Self { config, ..self }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.token_service)
    }
}

fn parse_id(raw: &str, invalid: TaskValidationError) -> Result<TaskId, ApiErrorResponse> {
    TaskId::parse(raw).map_err(|_| ApiErrorResponse::from(invalid))
}

// =============================================================================
// POST /Task Handler
// =============================================================================

/// Creates a new task.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Task title",
///   "description": "Optional description",
///   "dueDate": "2025-01-01",
///   "completed": false
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: `{success: true, message: {acknowledged, insertedId}}`
///
/// # Errors
///
/// - **400 Bad Request**: malformed body, missing `title`/`dueDate`, bad date
/// - **500 Internal Server Error**: store failure
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTaskResponse>), ApiErrorResponse> {
    let Json(request) = body?;
    let document = request.into_document()?;

    let result = state.task_store.insert_one(document).await?;
    tracing::info!(task_id = %result.inserted_id, user_id = %user.user_id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            success: true,
            message: result,
        }),
    ))
}

// =============================================================================
// GET /Task/{id} Handler
// =============================================================================

/// Fetches a single task.
///
/// # Errors
///
/// - **400 Bad Request**: `id` is not a valid identifier
/// - **500 Internal Server Error**: store failure, or no task with this `id`
///   (code `TASK_NOT_FOUND`; a missing record is reported as a server error
///   rather than 404)
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<GetTaskResponse>, ApiErrorResponse> {
    let task_id = parse_id(&id, TaskValidationError::InvalidId)?;

    let task = state
        .task_store
        .find_one(task_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(%task_id, "Task not found");
            ApiErrorResponse::internal_error("TASK_NOT_FOUND", "Task not found")
        })?;

    Ok(Json(GetTaskResponse {
        success: true,
        task,
        timestamp: response_timestamp(),
    }))
}

// =============================================================================
// PUT /Task/{id} Handler
// =============================================================================

/// Partially updates a task. Only supplied fields change.
///
/// # Errors
///
/// - **400 Bad Request**: invalid `id`, no fields supplied, bad field values
/// - **404 Not Found**: no task with this `id`
/// - **500 Internal Server Error**: store failure
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<UpdateTaskResponse>, ApiErrorResponse> {
    let task_id = parse_id(&id, TaskValidationError::InvalidUpdateId)?;
    let Json(request) = body?;
    let patch = request.into_patch()?;

    let result = state.task_store.update_one(task_id, patch).await?;
    if result.matched_count == 0 {
        return Err(ApiErrorResponse::not_found("Task not found"));
    }
    tracing::info!(%task_id, user_id = %user.user_id, modified = result.modified_count, "Task updated");

    Ok(Json(UpdateTaskResponse {
        success: true,
        message: result,
        timestamp: response_timestamp(),
    }))
}

// =============================================================================
// DELETE /Task/{id} Handler
// =============================================================================

/// Deletes a task.
///
/// Answers 204 whether or not a task matched; `result.deletedCount` tells
/// the two apart. The confirmation body is attached to the 204 even though
/// HTTP servers normally drop it.
///
/// # Errors
///
/// - **400 Bad Request**: `id` is not a valid identifier
/// - **500 Internal Server Error**: store failure
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteTaskResponse>), ApiErrorResponse> {
    let task_id = parse_id(&id, TaskValidationError::InvalidId)?;

    let result = state.task_store.delete_one(task_id).await?;
    tracing::info!(%task_id, user_id = %user.user_id, deleted = result.deleted_count, "Task deleted");

    Ok((
        StatusCode::NO_CONTENT,
        Json(DeleteTaskResponse {
            success: true,
            message: "Task deleted".to_string(),
            result,
            timestamp: response_timestamp(),
        }),
    ))
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Reports that the service is running.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_app_config_default_page_limit() {
        assert_eq!(AppConfig::default().default_page_limit, 10);
    }

    #[rstest]
    #[case("not-a-uuid", TaskValidationError::InvalidId, "Invalid _id")]
    #[case("123", TaskValidationError::InvalidUpdateId, "Invalid ID")]
    fn test_parse_id_rejects(
        #[case] raw: &str,
        #[case] invalid: TaskValidationError,
        #[case] message: &str,
    ) {
        let error = parse_id(raw, invalid).unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error.message, message);
    }

    #[rstest]
    fn test_parse_id_accepts_uuid() {
        let id = TaskId::generate();
        assert_eq!(
            parse_id(&id.to_string(), TaskValidationError::InvalidId).unwrap(),
            id
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_health_check() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
