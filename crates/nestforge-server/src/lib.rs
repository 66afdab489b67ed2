//! nestforge HTTP server.
//!
//! Exposes the build pipeline, declaration extraction and the module catalog
//! of `nestforge-core` over a JSON HTTP API.
//!
//! # Architecture
//!
//! - **Routes**: axum handlers; builds and extractions run on the blocking pool
//! - **Protocol**: request/response bodies
//! - **Error**: translation of core failures into HTTP responses

pub mod error;
pub mod protocol;
pub mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

pub use error::{ServerError, ServerResult};
pub use protocol::{ErrorBody, ScriptResponse, SpecsRequest, VersionInfo};
pub use routes::{AppState, create_router};

/// Default port to listen on.
pub const DEFAULT_PORT: u16 = 52426;

/// Default code generator program.
pub const DEFAULT_GENERATOR: &str = "nestml";

/// Default modules root: `<temp dir>/nestmlmodules`.
pub fn default_modules_root() -> PathBuf {
    std::env::temp_dir().join("nestmlmodules")
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory all modules are built under.
    pub modules_root: PathBuf,
    /// Code generator program name or path.
    pub generator: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            modules_root: default_modules_root(),
            generator: DEFAULT_GENERATOR.to_string(),
        }
    }
}

/// Start the nestforge server and run until Ctrl+C.
pub async fn serve(config: ServerConfig) -> ServerResult<()> {
    let state = Arc::new(AppState::from_config(&config)?);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| {
            ServerError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid address: {}:{}", config.host, config.port),
            ))
        })?;

    tracing::info!("Modules root: {}", config.modules_root.display());
    tracing::info!("Starting nestforge server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
        }
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
