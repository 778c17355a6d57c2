//! Application configuration management.
//!
//! Configuration is read once at startup from environment variables (after
//! loading `.env`). Missing or invalid values are reported as
//! [`ConfigError`] and stop the process before it starts serving.
//!
//! # Environment Variables
//!
//! - `HOST`: bind host (default `0.0.0.0`)
//! - `PORT`: bind port (default `3333`)
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: required when `STORAGE_MODE=postgres`
//! - `DATABASE_MAX_CONNECTIONS`: pool upper bound (default `10`)
//! - `DATABASE_MIN_CONNECTIONS`: pool lower bound (default `1`)
//! - `JWT_PRIVATE_KEY_PATH`: PEM RSA private key (required)
//! - `JWT_PUBLIC_KEY_PATH`: PEM RSA public key (required)
//! - `USERS_FILE`: YAML user list (optional)

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use super::factory::{StorageMode, StoreConfig};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3333;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;

// =============================================================================
// Config Error
// =============================================================================

/// Errors raised while assembling startup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Invalid storage mode value.
    #[error("Invalid STORAGE_MODE: '{0}'. Valid values: in_memory, postgres")]
    InvalidStorageMode(String),

    /// `DATABASE_URL` is required when `STORAGE_MODE=postgres`.
    #[error("DATABASE_URL is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    /// Signing or verification key could not be loaded.
    #[error("Unusable key material at {path}: {message}")]
    KeyMaterial { path: String, message: String },

    /// The user list could not be read or parsed.
    #[error("Unusable users file at {path}: {message}")]
    UsersFile { path: String, message: String },
}

// =============================================================================
// Server Config
// =============================================================================

/// Locations of the token key pair and the user list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub users_file: Option<PathBuf>,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// Empty and whitespace-only values are treated as unset.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| read(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let host = read("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("PORT", read("PORT"), DEFAULT_PORT)?;

        let storage_mode = read("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();
        let store = StoreConfig {
            storage_mode,
            database_url: read("DATABASE_URL"),
            max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                read("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            min_connections: parse_or(
                "DATABASE_MIN_CONNECTIONS",
                read("DATABASE_MIN_CONNECTIONS"),
                DEFAULT_MIN_CONNECTIONS,
            )?,
        };
        store.validate()?;

        let auth = AuthConfig {
            private_key_path: PathBuf::from(required("JWT_PRIVATE_KEY_PATH")?),
            public_key_path: PathBuf::from(required("JWT_PUBLIC_KEY_PATH")?),
            users_file: read("USERS_FILE").map(PathBuf::from),
        };

        Ok(Self {
            host,
            port,
            store,
            auth,
        })
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |value| {
        value.parse().map_err(|error: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: error.to_string(),
        })
    })
}

// =============================================================================
// Tests
// =============================================================================
