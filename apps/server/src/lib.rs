//! # Keeper Server
//!
//! HTTP and WebSocket front of the vault: unary register/login endpoints, the interactive
//! command stream, a health probe and the `OpenAPI` UI, served over axum with optional TLS.
//!
//! ## Example
//! ```no_run
//! use keeper_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(50051)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod error;
mod handlers;
mod router;
mod state;
mod transport;

pub use crate::error::{ApiError, ErrorResponse};
pub use crate::handlers::auth::{Credentials, MessageResponse};
pub use crate::handlers::health::HealthResponse;
pub use crate::state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
pub use crate::transport::{WsSink, WsStream};

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use keeper_database::SurrealStorage;
use keeper_domain::config::ApiConfig;
use keeper_identity::IdentityService;
use keeper_kernel::Shutdown;
use keeper_session::SessionEngine;
use keeper_vault::Vault;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    fn validate_ssl_config(&self) -> Result<()> {
        if let Some(ssl) = &self.cfg.server.ssl {
            if !ssl.cert.exists() {
                anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
            }
            if !ssl.key.exists() {
                anyhow::bail!("SSL key not found at: {}", ssl.key.display());
            }

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let metadata = ssl.key.metadata()?;
                if metadata.permissions().mode() & 0o077 != 0 {
                    warn!(
                        "SECURITY: SSL Private Key {} has insecure permissions (should be 600)",
                        ssl.key.display()
                    );
                }
            }
        }
        Ok(())
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Checks the TLS files when `server.ssl` is set
    /// 2. Connects storage and applies the schema
    /// 3. Builds the record codec from `vault`
    /// 4. Wires the identity service and the session engine
    /// 5. Purges session mirror rows left behind by a previous process
    ///
    /// # Errors
    /// Returns an error if:
    /// * SSL certificate/key files are missing
    /// * The database is unreachable or rejects the credentials
    /// * The vault secret is not a valid key
    pub async fn build(self) -> Result<Server> {
        self.validate_ssl_config()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        let storage = SurrealStorage::connect(&self.cfg.database)
            .await
            .context("Failed to establish database connection")?;

        let vault: Vault = Vault::from_config(&self.cfg.vault).context("Invalid vault secret")?;

        let identity = IdentityService::new(storage.clone());
        let engine = Arc::new(SessionEngine::new(storage, vault, self.cfg.session.clone()));

        match engine.registry().recover().await {
            Ok(0) => {}
            Ok(purged) => info!(purged, "Removed stale session rows"),
            Err(e) => warn!(error = %e, "Could not reconcile session rows"),
        }

        let state = ApiState::builder()
            .config(self.cfg)
            .identity(identity)
            .engine(engine)
            .shutdown(Shutdown::new())
            .build()
            .context("Failed to finalize API state")?;

        Ok(Server { state })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The HTTP router without a listener, for embedding and tests.
    pub fn router(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Trigger side of the process-wide shutdown signal; firing it stops [`Server::run`].
    #[must_use]
    pub fn shutdown(&self) -> Shutdown {
        self.state.shutdown.clone()
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }

    /// Starts the server and runs until a shutdown signal is received.
    ///
    /// On shutdown every command session is terminated and open connections get
    /// `server.shutdown_grace_seconds` to drain.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address
    /// or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        info!(address = %address, ssl = cfg.server.ssl.is_some(), "Starting server");

        let app = self.router();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();
        let state = self.state.clone();
        let grace = Duration::from_secs(cfg.server.shutdown_grace_seconds);

        tokio::spawn(async move {
            let mut listener = state.shutdown.subscribe();
            tokio::select! {
                res = shutdown_signal() => {
                    if let Err(e) = res {
                        error!("Error while waiting for shutdown signal: {e}");
                        return;
                    }
                    info!("Shutdown signal received, starting graceful shutdown...");
                }
                () = listener.recv() => info!("Shutdown requested, starting graceful shutdown..."),
            }

            state.shutdown.trigger();
            state.engine.registry().terminate_all();
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        if let Some(ssl_config) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &ssl_config.cert,
                &ssl_config.key,
            )
            .await
            .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
