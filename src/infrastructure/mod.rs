//! Infrastructure module for external services.
//!
//! This module contains the task store backends, the credential store,
//! startup configuration and the factory that wires them together.

pub mod config;
pub mod credentials;
pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use config::{AuthConfig, ConfigError, ServerConfig};
pub use credentials::StaticCredentialStore;
pub use factory::{StorageMode, StoreConfig, StoreFactory, Stores};
pub use in_memory::InMemoryTaskStore;
pub use postgres::PostgresTaskStore;
pub use repository::{
    CredentialStore, DeleteResult, InsertOneResult, RepositoryError, SortDirection, SortField,
    TaskFilter, TaskQuery, TaskSort, TaskStore, UpdateResult,
};
