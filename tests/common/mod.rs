//! Common test helpers for integration tests.
//!
//! Builds the full router over an in-memory task store, the fixture user
//! list and the fixture key pair, and drives it with `oneshot`.
//!
//! # Note
//!
//! Each integration test file is compiled as its own crate, so helpers used
//! by only one of them would otherwise warn as dead code.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use task_api::api::{AppState, create_router};
use task_api::auth::TokenService;
use task_api::domain::UserId;
use task_api::infrastructure::{InMemoryTaskStore, StaticCredentialStore};

pub const ALICE_ID: &str = "7f3c2a10-0000-4000-8000-000000000001";
pub const ALICE_PASSWORD: &str = "secret-pass";

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn primary_tokens() -> TokenService {
    TokenService::from_pem_files(
        &fixture_path("primary_private.pem"),
        &fixture_path("primary_public.pem"),
    )
    .unwrap()
}

pub fn foreign_tokens() -> TokenService {
    TokenService::from_pem_files(
        &fixture_path("foreign_private.pem"),
        &fixture_path("foreign_public.pem"),
    )
    .unwrap()
}

// =============================================================================
// Test App
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub tokens: Arc<TokenService>,
    pub store: InMemoryTaskStore,
}

impl TestApp {
    pub fn new() -> Self {
        let store = InMemoryTaskStore::new();
        let tokens = Arc::new(primary_tokens());
        let credentials = StaticCredentialStore::from_file(&fixture_path("users.yaml")).unwrap();

        let router = create_router(AppState::new(
            Arc::new(store.clone()),
            Arc::new(credentials),
            Arc::clone(&tokens),
        ));

        Self {
            router,
            tokens,
            store,
        }
    }

    /// A token for alice signed with the server's key.
    pub fn token(&self) -> String {
        self.tokens.issue(&UserId::new(ALICE_ID)).unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    /// Sends a request carrying `Authorization: Bearer <token>`.
    pub async fn send_authorized(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let authorization = format!("Bearer {token}");
        self.send(method, uri, Some(&authorization), body).await
    }

    /// Creates a task and returns its identifier.
    pub async fn create_task(&self, body: Value) -> String {
        let token = self.token();
        let (status, json) = self
            .send_authorized(Method::POST, "/Task", &token, Some(body))
            .await;
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {json}");
        json["message"]["insertedId"].as_str().unwrap().to_string()
    }
}
