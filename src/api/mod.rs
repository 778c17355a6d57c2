//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod login;
pub mod query;
pub mod routes;

pub use dto::{
    CreateTaskRequest, CreateTaskResponse, DeleteTaskResponse, DueDateInput, GetTaskResponse,
    ListTasksResponse, LoginRequest, LoginResponse, UpdateTaskRequest, UpdateTaskResponse,
    response_timestamp,
};
pub use error::{ApiError, ApiErrorResponse, TaskValidationError};
pub use handlers::{
    AppConfig, AppState, HealthResponse, create_task, delete_task, get_task, health_check,
    update_task,
};
pub use login::login;
pub use query::{ListTasksQuery, QueryPlan, QueryPlanError, build_query_plan, list_tasks};
pub use routes::create_router;
