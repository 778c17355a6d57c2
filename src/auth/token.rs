//! Signed bearer tokens.
//!
//! Tokens are RS256 JWTs carrying `{userId, iat, exp}` and expire one hour
//! after issuance. The private key signs, the public key verifies; both are
//! handed in at construction.

use std::path::Path;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;
use crate::infrastructure::ConfigError;

/// Lifetime of an issued token.
pub const TOKEN_LIFETIME_SECONDS: i64 = 60 * 60;

const ALGORITHM: Algorithm = Algorithm::RS256;

// =============================================================================
// Claims
// =============================================================================

/// Payload of an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

// =============================================================================
// Token Error
// =============================================================================

/// Why a token could not be issued or accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// A key could not be parsed.
    #[error("Key material error: {0}")]
    KeyMaterial(String),

    /// Signing a new token failed.
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// The token was valid but its `exp` has passed.
    #[error("Token expired")]
    Expired,

    /// Bad signature, wrong algorithm, malformed encoding or bad claims.
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// The payload is not an object carrying a non-empty `userId`.
    #[error("Token payload has no user identifier")]
    MissingUserId,
}

// =============================================================================
// Token Service
// =============================================================================

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenService")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Builds the service from PEM-encoded RSA keys.
    ///
    /// A probe token is signed and verified so that a mismatched pair is
    /// caught here rather than on the first login.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::KeyMaterial` if either key fails to parse or the
    /// keys do not belong to the same pair.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem)
            .map_err(|error| TokenError::KeyMaterial(format!("private key: {error}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem)
            .map_err(|error| TokenError::KeyMaterial(format!("public key: {error}")))?;

        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let service = Self {
            encoding_key,
            decoding_key,
            validation,
        };

        let probe = service.issue(&UserId::new("key-check"))?;
        service.verify(&probe).map_err(|error| {
            TokenError::KeyMaterial(format!("private and public keys do not match: {error}"))
        })?;

        Ok(service)
    }

    /// Reads both keys from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::KeyMaterial` naming the offending path.
    pub fn from_pem_files(private_path: &Path, public_path: &Path) -> Result<Self, ConfigError> {
        let read = |path: &Path| {
            std::fs::read(path).map_err(|error| ConfigError::KeyMaterial {
                path: path.display().to_string(),
                message: error.to_string(),
            })
        };
        let private_pem = read(private_path)?;
        let public_pem = read(public_path)?;

        Self::from_pem(&private_pem, &public_pem).map_err(|error| ConfigError::KeyMaterial {
            path: format!("{} / {}", private_path.display(), public_path.display()),
            message: error.to_string(),
        })
    }

    /// Issues a token for the user, valid for one hour from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue(&self, user_id: &UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if signing fails.
    pub fn issue_at(&self, user_id: &UserId, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            user_id: user_id.as_str().to_string(),
            iat,
            exp: iat + TOKEN_LIFETIME_SECONDS,
        };
        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|error| TokenError::Signing(error.to_string()))
    }

    /// Verifies signature, algorithm and expiry, then extracts the user.
    ///
    /// # Errors
    ///
    /// - `TokenError::Expired` when `exp` has passed
    /// - `TokenError::MissingUserId` when the payload is not an object with `userId`
    /// - `TokenError::Invalid` for every other failure
    pub fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        let data = decode::<serde_json::Value>(token, &self.decoding_key, &self.validation)
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(error.to_string()),
            })?;

        data.claims
            .as_object()
            .and_then(|claims| claims.get("userId"))
            .and_then(serde_json::Value::as_str)
            .filter(|user_id| !user_id.is_empty())
            .map(UserId::new)
            .ok_or(TokenError::MissingUserId)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::{fixture, rstest};

    const PRIMARY_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/primary_private.pem");
    const PRIMARY_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/primary_public.pem");
    const FOREIGN_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/foreign_private.pem");
    const FOREIGN_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/foreign_public.pem");

    #[fixture]
    fn service() -> TokenService {
        TokenService::from_pem(PRIMARY_PRIVATE, PRIMARY_PUBLIC).unwrap()
    }

    fn sign_raw<T: Serialize>(payload: &T) -> String {
        let key = EncodingKey::from_rsa_pem(PRIMARY_PRIVATE).unwrap();
        encode(&Header::new(Algorithm::RS256), payload, &key).unwrap()
    }

    #[rstest]
    fn test_issue_then_verify(service: TokenService) {
        let token = service.issue(&UserId::new("user-1")).unwrap();
        assert_eq!(service.verify(&token), Ok(UserId::new("user-1")));
    }

    #[rstest]
    fn test_issued_token_expires_after_one_hour(service: TokenService) {
        let issued_at = Utc::now() - Duration::seconds(TOKEN_LIFETIME_SECONDS + 5);
        let token = service.issue_at(&UserId::new("user-1"), issued_at).unwrap();
        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[rstest]
    fn test_token_just_inside_lifetime_is_accepted(service: TokenService) {
        let issued_at = Utc::now() - Duration::seconds(TOKEN_LIFETIME_SECONDS - 60);
        let token = service.issue_at(&UserId::new("user-1"), issued_at).unwrap();
        assert!(service.verify(&token).is_ok());
    }

    #[rstest]
    fn test_token_from_foreign_key_is_rejected(service: TokenService) {
        let foreign = TokenService::from_pem(FOREIGN_PRIVATE, FOREIGN_PUBLIC).unwrap();
        let token = foreign.issue(&UserId::new("intruder")).unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[rstest]
    fn test_hmac_token_is_rejected(service: TokenService) {
        let claims = Claims {
            user_id: "user-1".to_string(),
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"shared-secret"),
        )
        .unwrap();
        assert!(matches!(service.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[rstest]
    fn test_payload_without_user_id_is_rejected(service: TokenService) {
        let token = sign_raw(&serde_json::json!({ "exp": Utc::now().timestamp() + 600 }));
        assert_eq!(service.verify(&token), Err(TokenError::MissingUserId));
    }

    #[rstest]
    fn test_scalar_payload_is_rejected(service: TokenService) {
        let token = sign_raw(&"user-1");
        assert!(service.verify(&token).is_err());
    }

    #[rstest]
    fn test_payload_without_expiry_is_rejected(service: TokenService) {
        let token = sign_raw(&serde_json::json!({ "userId": "user-1" }));
        assert!(matches!(service.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[rstest]
    #[case("")]
    #[case("not.a.jwt")]
    #[case("abc")]
    fn test_garbage_is_rejected(service: TokenService, #[case] token: &str) {
        assert!(matches!(service.verify(token), Err(TokenError::Invalid(_))));
    }

    #[rstest]
    fn test_mismatched_key_pair_fails_construction() {
        let result = TokenService::from_pem(PRIMARY_PRIVATE, FOREIGN_PUBLIC);
        assert!(matches!(result, Err(TokenError::KeyMaterial(_))));
    }

    #[rstest]
    fn test_unparseable_key_fails_construction() {
        let result = TokenService::from_pem(b"not a key", PRIMARY_PUBLIC);
        assert!(matches!(result, Err(TokenError::KeyMaterial(_))));
    }

    #[rstest]
    fn test_from_pem_files_reports_missing_path() {
        let result = TokenService::from_pem_files(
            Path::new("/nonexistent/private.pem"),
            Path::new("/nonexistent/public.pem"),
        );
        assert!(matches!(
            result,
            Err(ConfigError::KeyMaterial { path, .. }) if path == "/nonexistent/private.pem"
        ));
    }
}
