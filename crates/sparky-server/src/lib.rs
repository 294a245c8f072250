//! # sparky-server
//!
//! Axum REST API for sparkyservice.
//!
//! Endpoints under `/api/v1`:
//!
//! | Method | Path | Access |
//! |--------|------|--------|
//! | GET | `/heartbeat` | public |
//! | POST | `/authenticate` | public |
//! | GET | `/authenticate/verify?jwtToken=..` | public |
//! | GET | `/authenticate/check` | bearer |
//! | PUT, PATCH, GET | `/users` | bearer |
//! | GET | `/users/{realm}` | bearer |
//! | GET, DELETE | `/users/{realm}/{username}` | bearer |
//!
//! ## Usage
//!
//! ```ignore
//! use sparky_core::Config;
//! use sparky_server::Server;
//!
//! let config = Config::from_env()?;
//! let server = Server::new(config)?;
//! server.run().await?;
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod auth;
pub mod dto;
pub mod error;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use router::{API_PREFIX, create_router};
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sparky_core::Config;
use sparky_storage::InMemoryUserStore;
use tokio::net::TcpListener;

/// The sparkyservice server.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Creates a new server instance backed by the in-memory user store.
    ///
    /// # Errors
    ///
    /// Fails if the configured memory users are invalid.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(InMemoryUserStore::new());
        let state = AppState::new(config, store, None)?;
        Ok(Self { state })
    }

    /// Creates a server around prepared state.
    #[must_use]
    pub const fn with_state(state: AppState) -> Self {
        Self { state }
    }

    /// Runs the server.
    ///
    /// This starts the HTTP server and blocks until it receives a shutdown signal.
    pub async fn run(self) -> anyhow::Result<()> {
        let addr: SocketAddr = self.state.config().bind_address().parse()?;
        let app = create_router(self.state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Returns the shared state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates a router without starting the server.
    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }
}

/// Waits for a shutdown signal.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
