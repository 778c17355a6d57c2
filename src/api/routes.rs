//! Route configuration.
//!
//! # Routes
//!
//! | Method | Path | Handler | Auth |
//! |--------|------|---------|------|
//! | GET | /Task | `list_tasks` | none |
//! | POST | /Task | `create_task` | bearer |
//! | GET | /Task/{id} | `get_task` | none |
//! | PUT | /Task/{id} | `update_task` | bearer |
//! | DELETE | /Task/{id} | `delete_task` | bearer |
//! | POST | /login | `login` | none |
//! | GET | /health | `health_check` | none |
//!
//! Every route is also served under `/api`.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{AppState, create_task, delete_task, get_task, health_check, update_task};
use super::login::login;
use super::query::list_tasks;

fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/Task", get(list_tasks).post(create_task))
        .route(
            "/Task/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/login", post(login))
}

/// Builds the application router with tracing and CORS applied.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(resource_routes())
        .nest("/api", resource_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use rstest::rstest;
    use tower::ServiceExt;

    use crate::auth::TokenService;
    use crate::infrastructure::{InMemoryTaskStore, StaticCredentialStore};

    fn create_test_router() -> Router {
        let tokens = TokenService::from_pem(
            include_bytes!("../../tests/fixtures/primary_private.pem"),
            include_bytes!("../../tests/fixtures/primary_public.pem"),
        )
        .unwrap();
        create_router(AppState::new(
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(StaticCredentialStore::default()),
            Arc::new(tokens),
        ))
    }

    #[rstest]
    #[case("/health")]
    #[case("/api/health")]
    #[tokio::test]
    async fn test_health_is_served_at_both_prefixes(#[case] uri: &str) {
        let response = create_test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[rstest]
    #[case("/Task")]
    #[case("/api/Task")]
    #[tokio::test]
    async fn test_list_is_served_at_both_prefixes(#[case] uri: &str) {
        let response = create_test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = create_test_router()
            .oneshot(Request::builder().uri("/tasks").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
