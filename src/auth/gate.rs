//! Bearer-token gate for mutating routes.
//!
//! [`AuthenticatedUser`] is an extractor: a handler that names it in its
//! arguments is only reached when the `Authorization` header carries a
//! valid token.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::token::{TokenError, TokenService};
use crate::api::response_timestamp;
use crate::domain::UserId;

const BEARER_SCHEME: &str = "Bearer";

// =============================================================================
// Rejection
// =============================================================================

/// Why a request was stopped at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    MissingHeader,
    /// Header is not exactly two space-separated parts.
    MalformedHeader,
    InvalidScheme,
    InvalidToken,
    ExpiredToken,
}

impl AuthRejection {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::MissingHeader => StatusCode::BAD_REQUEST,
            Self::MalformedHeader | Self::InvalidScheme | Self::InvalidToken | Self::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
        }
    }

    #[must_use]
    pub const fn error_id(self) -> &'static str {
        match self {
            Self::MissingHeader => "AUTH_HEADER_MISSING",
            Self::MalformedHeader => "AUTH_HEADER_MALFORMED",
            Self::InvalidScheme => "AUTH_SCHEME_INVALID",
            Self::InvalidToken => "TOKEN_INVALID",
            Self::ExpiredToken => "TOKEN_EXPIRED",
        }
    }

    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header missing",
            Self::MalformedHeader => "Invalid Authorization header format",
            Self::InvalidScheme => "Invalid Authorization scheme, expected Bearer",
            Self::InvalidToken => "Invalid token",
            Self::ExpiredToken => "Token expired",
        }
    }
}

/// Body of every gate rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthErrorBody {
    pub errors: Vec<String>,
    pub code: u16,
    pub error_id: String,
    pub timestamp: String,
}

impl From<AuthRejection> for AuthErrorBody {
    fn from(rejection: AuthRejection) -> Self {
        Self {
            errors: vec![rejection.message().to_string(), "Unauthorized".to_string()],
            code: rejection.status().as_u16(),
            error_id: rejection.error_id().to_string(),
            timestamp: response_timestamp(),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status(), Json(AuthErrorBody::from(self))).into_response()
    }
}

// =============================================================================
// Authenticated User
// =============================================================================

/// The caller proven by a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl AuthenticatedUser {
    /// Checks an `Authorization` header value against the token service.
    ///
    /// Shape and scheme are checked before the signature.
    ///
    /// # Errors
    ///
    /// Returns the [`AuthRejection`] for the first check that fails.
    pub fn from_header(
        header: Option<&HeaderValue>,
        tokens: &TokenService,
    ) -> Result<Self, AuthRejection> {
        let header = header.ok_or(AuthRejection::MissingHeader)?;
        let header = header
            .to_str()
            .map_err(|_| AuthRejection::MalformedHeader)?;

        let parts: Vec<&str> = header.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(AuthRejection::MalformedHeader);
        };
        if *scheme != BEARER_SCHEME {
            return Err(AuthRejection::InvalidScheme);
        }

        match tokens.verify(token) {
            Ok(user_id) => Ok(Self { user_id }),
            Err(TokenError::Expired) => Err(AuthRejection::ExpiredToken),
            Err(_) => Err(AuthRejection::InvalidToken),
        }
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);
        Self::from_header(parts.headers.get(AUTHORIZATION), &tokens).inspect_err(|rejection| {
            tracing::warn!(
                reason = rejection.error_id(),
                method = %parts.method,
                path = %parts.uri.path(),
                "Request rejected at auth gate"
            );
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn tokens() -> TokenService {
        TokenService::from_pem(
            include_bytes!("../../tests/fixtures/primary_private.pem"),
            include_bytes!("../../tests/fixtures/primary_public.pem"),
        )
        .unwrap()
    }

    fn check(header: Option<&str>, tokens: &TokenService) -> Result<AuthenticatedUser, AuthRejection> {
        let header = header.map(|value| HeaderValue::from_str(value).unwrap());
        AuthenticatedUser::from_header(header.as_ref(), tokens)
    }

    #[rstest]
    fn test_valid_bearer_token(tokens: TokenService) {
        let token = tokens.issue(&UserId::new("user-1")).unwrap();
        let user = check(Some(&format!("Bearer {token}")), &tokens).unwrap();
        assert_eq!(user.user_id, UserId::new("user-1"));
    }

    #[rstest]
    #[case(None, AuthRejection::MissingHeader)]
    #[case(Some("Bearer"), AuthRejection::MalformedHeader)]
    #[case(Some("Bearer a b"), AuthRejection::MalformedHeader)]
    #[case(Some("Bearer  token"), AuthRejection::MalformedHeader)]
    #[case(Some("Basic dXNlcjpwYXNz"), AuthRejection::InvalidScheme)]
    #[case(Some("bearer token"), AuthRejection::InvalidScheme)]
    #[case(Some("Bearer not-a-token"), AuthRejection::InvalidToken)]
    fn test_rejections(
        tokens: TokenService,
        #[case] header: Option<&str>,
        #[case] expected: AuthRejection,
    ) {
        assert_eq!(check(header, &tokens), Err(expected));
    }

    #[rstest]
    fn test_expired_token(tokens: TokenService) {
        let token = tokens
            .issue_at(&UserId::new("user-1"), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(
            check(Some(&format!("Bearer {token}")), &tokens),
            Err(AuthRejection::ExpiredToken)
        );
    }

    #[rstest]
    #[case(AuthRejection::MissingHeader, 400)]
    #[case(AuthRejection::MalformedHeader, 401)]
    #[case(AuthRejection::InvalidScheme, 401)]
    #[case(AuthRejection::InvalidToken, 401)]
    #[case(AuthRejection::ExpiredToken, 401)]
    fn test_rejection_body(#[case] rejection: AuthRejection, #[case] code: u16) {
        let body = AuthErrorBody::from(rejection);
        assert_eq!(body.code, code);
        assert_eq!(body.errors.len(), 2);
        assert_eq!(body.errors[1], "Unauthorized");
        assert_eq!(body.error_id, rejection.error_id());
        assert!(body.timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&body.timestamp).is_ok());
    }

    #[rstest]
    fn test_error_ids_are_distinct() {
        let ids = [
            AuthRejection::MissingHeader,
            AuthRejection::MalformedHeader,
            AuthRejection::InvalidScheme,
            AuthRejection::InvalidToken,
            AuthRejection::ExpiredToken,
        ]
        .map(AuthRejection::error_id);
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
