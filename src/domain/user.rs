//! User identity held by the credential store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier embedded in issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Lowercase hex SHA-256 digest of a password.
///
/// Only digests are kept in memory; the plaintext supplied at login is
/// hashed and compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hashes a plaintext password.
    #[must_use]
    pub fn of(password: &str) -> Self {
        Self(hex::encode(Sha256::digest(password.as_bytes())))
    }

    /// Wraps a digest read from configuration, normalizing case.
    #[must_use]
    pub fn from_hex(digest: &str) -> Self {
        Self(digest.trim().to_ascii_lowercase())
    }

    /// Returns true when `password` hashes to this digest.
    ///
    /// Compares every byte regardless of where the first mismatch occurs.
    #[must_use]
    pub fn matches(&self, password: &str) -> bool {
        let candidate = Self::of(password);
        self.0.len() == candidate.0.len()
            && self
                .0
                .bytes()
                .zip(candidate.0.bytes())
                .fold(0u8, |difference, (left, right)| difference | (left ^ right))
                == 0
    }
}

impl From<String> for PasswordDigest {
    fn from(digest: String) -> Self {
        Self::from_hex(&digest)
    }
}

impl From<PasswordDigest> for String {
    fn from(digest: PasswordDigest) -> Self {
        digest.0
    }
}

/// A user allowed to log in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_sha256: PasswordDigest,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>, password: &str) -> Self {
        Self {
            id: UserId::new(id),
            username: username.into(),
            password_sha256: PasswordDigest::of(password),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_password_digest_known_value() {
        assert_eq!(
            PasswordDigest::of("hunter2"),
            PasswordDigest::from_hex(
                "F52FBD32B2B3B86FF88EF6C490628285F482AF15DDCB29541F94BCF526A3F6C7"
            )
        );
    }

    #[rstest]
    #[case("hunter2", true)]
    #[case("hunter3", false)]
    #[case("", false)]
    fn test_password_digest_matches(#[case] attempt: &str, #[case] expected: bool) {
        let user = User::new("1", "bob", "hunter2");
        assert_eq!(user.password_sha256.matches(attempt), expected);
    }

    #[rstest]
    fn test_user_deserializes_from_camel_case() {
        let user: User = serde_json::from_str(
            r#"{"id":"u1","username":"alice","passwordSha256":"abc"}"#,
        )
        .unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.password_sha256, PasswordDigest::from_hex("ABC"));
    }
}
