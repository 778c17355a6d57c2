//! Task API server.
//!
//! # Environment Variables
//!
//! - `HOST`: Server host address (default: `0.0.0.0`)
//! - `PORT`: Server port (default: `3333`)
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//! - `DATABASE_MAX_CONNECTIONS` / `DATABASE_MIN_CONNECTIONS`: pool bounds
//! - `JWT_PRIVATE_KEY_PATH` / `JWT_PUBLIC_KEY_PATH`: RSA key pair in PEM form
//! - `USERS_FILE`: YAML user list
//! - `RUST_LOG`: Logging level (e.g., `debug`, `task_api=debug`)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use task_api::api::{AppState, create_router};
use task_api::auth::TokenService;
use task_api::infrastructure::{
    AuthConfig, ConfigError, ServerConfig, StaticCredentialStore, StoreFactory,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Task API");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "Configuration error");
            std::process::exit(1);
        }
    };

    let (credential_store, token_service) = match load_auth(&config.auth) {
        Ok(auth) => auth,
        Err(error) => {
            tracing::error!(%error, "Authentication setup failed");
            std::process::exit(1);
        }
    };

    tracing::info!(storage_mode = ?config.store.storage_mode, "Store configuration loaded");

    let stores = match StoreFactory::new(config.store.clone()).create().await {
        Ok(stores) => {
            tracing::info!("Stores initialized successfully");
            stores
        }
        Err(error) => {
            tracing::error!(%error, "Failed to initialize stores");
            std::process::exit(1);
        }
    };

    let application = create_router(AppState::new(
        Arc::clone(&stores.task_store),
        Arc::new(credential_store),
        Arc::new(token_service),
    ));

    let address: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(address) => address,
        Err(error) => {
            tracing::error!(%error, "Invalid server address: {}:{}", config.host, config.port);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(address).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%error, "Failed to bind to address {}", address);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("Listening on {}", address),
        Err(error) => tracing::warn!(%error, "Could not determine local address"),
    }

    let served = axum::serve(listener, application)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    stores.shutdown().await;

    if let Err(error) = served {
        tracing::error!(%error, "Server error");
        std::process::exit(1);
    }

    tracing::info!("Server shutdown complete");
}

/// Loads the user list and the token key pair.
fn load_auth(auth: &AuthConfig) -> Result<(StaticCredentialStore, TokenService), ConfigError> {
    let credential_store = match &auth.users_file {
        Some(path) => {
            let store = StaticCredentialStore::from_file(path)?;
            tracing::info!(users = store.len(), path = %path.display(), "User list loaded");
            store
        }
        None => {
            tracing::warn!("USERS_FILE is not set; no user will be able to log in");
            StaticCredentialStore::default()
        }
    };

    let token_service =
        TokenService::from_pem_files(&auth.private_key_path, &auth.public_key_path)?;

    Ok((credential_store, token_service))
}

/// Completes when SIGINT (Ctrl+C) or, on Unix, SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
