//! `POST /login`: exchange a username and password for a bearer token.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::dto::{LoginRequest, LoginResponse};
use super::error::ApiErrorResponse;
use super::handlers::AppState;

const INVALID_CREDENTIALS: &str = "Invalid Username or password";

/// Authenticates a user and issues a token valid for one hour.
///
/// Unknown users and wrong passwords get the same answer.
///
/// # Response
///
/// - **200 OK**: `{message, token}`
///
/// # Errors
///
/// - **400 Bad Request**: malformed body
/// - **401 Unauthorized**: credentials do not match
/// - **500 Internal Server Error**: lookup or signing failed
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiErrorResponse> {
    let Json(request) = body?;
    let rejected = || ApiErrorResponse::unauthorized("INVALID_CREDENTIALS", INVALID_CREDENTIALS);

    let (Some(username), Some(password)) = (request.username, request.password) else {
        return Err(rejected());
    };

    let user = state
        .credential_store
        .find_by_username(&username)
        .await?
        .filter(|user| user.password_sha256.matches(&password))
        .ok_or_else(|| {
            tracing::warn!(%username, "Login rejected");
            rejected()
        })?;

    let token = state.token_service.issue(&user.id).map_err(|error| {
        tracing::error!(%error, user_id = %user.id, "Token signing failed");
        ApiErrorResponse::internal_error("INTERNAL_ERROR", "An internal error occurred")
    })?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}
