//! Store factory for runtime backend selection.
//!
//! Builds the task store named by [`StorageMode`]. For `PostgreSQL` a
//! single pool is created here and shared by every request for the life
//! of the process.
//!
//! # Example
//!
//! ```ignore
//! let stores = StoreFactory::new(config.store).create().await?;
//! let state = AppState::new(stores.task_store, credential_store, token_service);
//! ```

use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use super::config::ConfigError;
use super::{InMemoryTaskStore, PostgresTaskStore, RepositoryError, TaskStore};

// =============================================================================
// Configuration Types
// =============================================================================

/// Backend holding task documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local storage. Suitable for testing and development.
    #[default]
    InMemory,
    /// `PostgreSQL` JSONB documents.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidStorageMode` if the string is not recognized.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Store selection and pool sizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_mode: StorageMode,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::InMemory,
            database_url: None,
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl StoreConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is missing for `PostgreSQL` or the
    /// pool bounds are inconsistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS".to_string(),
                message: format!(
                    "pool bounds must satisfy 0 < min ({}) <= max ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Stores
// =============================================================================

/// Initialized stores ready to be placed in application state.
#[derive(Clone)]
pub struct Stores {
    pub task_store: Arc<dyn TaskStore>,
    /// Present when the backend owns a pool that must be closed on shutdown.
    pub postgres: Option<PostgresTaskStore>,
}

impl Stores {
    /// Releases backend resources. Call once, after the server has stopped.
    pub async fn shutdown(&self) {
        if let Some(postgres) = &self.postgres {
            postgres.close().await;
        }
    }
}

/// Creates stores from configuration.
#[derive(Debug, Clone)]
pub struct StoreFactory {
    config: StoreConfig,
}

impl StoreFactory {
    #[must_use]
    pub const fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Connects to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::ConnectionError` if the pool cannot be
    /// established, or `RepositoryError::DatabaseError` if the schema cannot
    /// be created.
    pub async fn create(&self) -> Result<Stores, RepositoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Stores {
                task_store: Arc::new(InMemoryTaskStore::new()),
                postgres: None,
            }),
            StorageMode::Postgres => {
                let url = self.config.database_url.as_deref().ok_or_else(|| {
                    RepositoryError::ConnectionError("DATABASE_URL is not set".to_string())
                })?;

                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .min_connections(self.config.min_connections)
                    .connect(url)
                    .await
                    .map_err(|error| RepositoryError::ConnectionError(error.to_string()))?;

                let store = PostgresTaskStore::new(pool);
                store.ensure_schema().await?;

                Ok(Stores {
                    task_store: Arc::new(store.clone()),
                    postgres: Some(store),
                })
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
