//! Read path: `GET /Task`.
//!
//! Raw query parameters are turned into a [`QueryPlan`] by a pure function
//! and only then handed to the store.
//!
//! # Query Parameters
//!
//! - `status`: `true` narrows to completed tasks
//! - `sortBy`: `dueDate` | `status`; anything else is ignored
//! - `sortOrder`: `1` (default) | `-1`; only read when `sortBy` is valid
//! - `page`, `limit`: positive integers; either one turns pagination on

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::dto::ListTasksResponse;
use super::error::ApiErrorResponse;
use super::handlers::AppState;
use crate::infrastructure::{SortDirection, SortField, TaskFilter, TaskQuery, TaskSort};

// =============================================================================
// Raw Parameters
// =============================================================================

/// Query string of `GET /Task`, kept verbatim so it can be echoed back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

// =============================================================================
// Query Plan
// =============================================================================

/// Why a list request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryPlanError {
    #[error("Invalid sortOrder. Use 1 for ascending or -1 for descending")]
    InvalidSortOrder,

    #[error("Invalid page or limit. Both must be positive integers")]
    InvalidPageOrLimit,
}

impl From<QueryPlanError> for ApiErrorResponse {
    fn from(error: QueryPlanError) -> Self {
        let code = match error {
            QueryPlanError::InvalidSortOrder => "INVALID_SORT_ORDER",
            QueryPlanError::InvalidPageOrLimit => "INVALID_PAGE_OR_LIMIT",
        };
        Self::bad_request(code, error.to_string())
    }
}

/// A validated list request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryPlan {
    pub query: TaskQuery,
    /// Resolved page, present only when pagination was requested.
    pub page: Option<u64>,
    /// Resolved page size, present only when pagination was requested.
    pub limit: Option<u64>,
}

/// Resolves raw parameters into a plan.
///
/// Empty parameters (`?page=`) are treated as absent.
///
/// # Errors
///
/// - `InvalidSortOrder` when `sortBy` is valid and `sortOrder` is not `1` or `-1`
/// - `InvalidPageOrLimit` when pagination is requested and either value is
///   not an integer >= 1
pub fn build_query_plan(
    parameters: &ListTasksQuery,
    default_limit: u64,
) -> Result<QueryPlan, QueryPlanError> {
    // Only `true` selects anything: there is no way to ask for incomplete
    // tasks, and `status=false` returns everything.
    let filter = TaskFilter {
        completed: (present(parameters.status.as_ref()) == Some("true")).then_some(true),
    };

    let sort = present(parameters.sort_by.as_ref())
        .and_then(SortField::from_name)
        .map(|field| {
            resolve_direction(present(parameters.sort_order.as_ref()))
                .map(|direction| TaskSort { field, direction })
        })
        .transpose()?;

    let page = present(parameters.page.as_ref());
    let limit = present(parameters.limit.as_ref());
    if page.is_none() && limit.is_none() {
        return Ok(QueryPlan {
            query: TaskQuery {
                filter,
                sort,
                skip: 0,
                limit: None,
            },
            page: None,
            limit: None,
        });
    }

    let page = parse_positive(page, 1)?;
    let limit = parse_positive(limit, default_limit)?;

    Ok(QueryPlan {
        query: TaskQuery {
            filter,
            sort,
            skip: (page - 1).saturating_mul(limit),
            limit: Some(limit),
        },
        page: Some(page),
        limit: Some(limit),
    })
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|value| !value.is_empty())
}

fn resolve_direction(order: Option<&str>) -> Result<SortDirection, QueryPlanError> {
    order.map_or(Ok(SortDirection::Ascending), |order| {
        order
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(SortDirection::from_order)
            .ok_or(QueryPlanError::InvalidSortOrder)
    })
}

fn parse_positive(value: Option<&str>, default: u64) -> Result<u64, QueryPlanError> {
    value.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|number| *number >= 1)
            .ok_or(QueryPlanError::InvalidPageOrLimit)
    })
}

// =============================================================================
// GET /Task Handler
// =============================================================================

/// Lists tasks with optional filter, sort and pagination.
///
/// # Response
///
/// - **200 OK**: `{success, tasks, query, page?, limit?}`
///
/// # Errors
///
/// - **400 Bad Request**: unparseable query string, invalid `sortOrder`,
///   invalid `page`/`limit`
/// - **500 Internal Server Error**: store failure
pub async fn list_tasks(
    State(state): State<AppState>,
    parameters: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<ListTasksResponse>, ApiErrorResponse> {
    let Query(parameters) = parameters.map_err(|rejection| {
        ApiErrorResponse::bad_request("MALFORMED_QUERY", rejection.body_text())
    })?;

    let plan = build_query_plan(&parameters, state.config.default_page_limit)?;
    tracing::debug!(?plan, "Listing tasks");

    let tasks = state.task_store.find(plan.query).await?;

    Ok(Json(ListTasksResponse {
        success: true,
        tasks,
        query: parameters,
        page: plan.page,
        limit: plan.limit,
    }))
}

// =============================================================================
// Tests
// =============================================================================
