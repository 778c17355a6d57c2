//! Static credential store.
//!
//! The user list is loaded once at startup and never mutated. The file is
//! YAML:
//!
//! ```yaml
//! users:
//!   - id: "7f3c2a10-0000-4000-8000-000000000001"
//!     username: alice
//!     passwordSha256: f38eb016...
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Deserialize;

use super::config::ConfigError;
use super::{CredentialStore, RepositoryError};
use crate::domain::User;

#[derive(Debug, Deserialize)]
struct UsersFile {
    #[serde(default)]
    users: Vec<User>,
}

/// Process-wide, read-only user list.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    users: Arc<[User]>,
}

impl StaticCredentialStore {
    #[must_use]
    pub fn new(users: Vec<User>) -> Self {
        Self {
            users: users.into(),
        }
    }

    /// Parses a YAML user list.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UsersFile` when the text is not a valid list or
    /// names the same user twice.
    pub fn from_yaml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let file: UsersFile = serde_yaml::from_str(text).map_err(|error| ConfigError::UsersFile {
            path: origin.to_string(),
            message: error.to_string(),
        })?;

        let mut seen = HashSet::new();
        if let Some(duplicate) = file
            .users
            .iter()
            .find(|user| !seen.insert(user.username.as_str()))
        {
            return Err(ConfigError::UsersFile {
                path: origin.to_string(),
                message: format!("duplicate username {:?}", duplicate.username),
            });
        }

        Ok(Self::new(file.users))
    }

    /// Reads and parses a YAML user list from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UsersFile` when the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::UsersFile {
            path: origin.clone(),
            message: error.to_string(),
        })?;
        Self::from_yaml(&text, &origin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn find_by_username(
        &self,
        username: &str,
    ) -> BoxFuture<'static, Result<Option<User>, RepositoryError>> {
        let found = self
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned();
        Box::pin(async move { Ok(found) })
    }
}
