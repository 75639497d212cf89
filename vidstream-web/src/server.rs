//! HTTP server for the Vidstream API
//!
//! Wires the catalog and stream orchestrator into an axum router.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use vidstream_core::config::VidstreamConfig;
use vidstream_core::streaming::{LocalFilesystem, StreamingOrchestrator};
use vidstream_core::{AccountError, AccountStore, TokenIssuer, VideoCatalog};

use crate::handlers::{
    delete_video, get_video, list_videos, login, patch_video, register, stream_video, upload_video,
};

/// Room for multipart framing and text fields on top of the file itself.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Video records
    pub catalog: Arc<VideoCatalog>,
    /// Stream composition over the catalog and local disk
    pub orchestrator: StreamingOrchestrator,
    /// Registered accounts
    pub accounts: Arc<AccountStore>,
    /// Signs and verifies access tokens
    pub tokens: Arc<TokenIssuer>,
    /// Settings the server was started with
    pub config: Arc<VidstreamConfig>,
}

impl AppState {
    /// Creates state streaming from local disk through `catalog`, with an
    /// empty account store.
    ///
    /// # Errors
    /// - `AccountError::Hashing` - Configured argon2 costs are unusable
    pub fn new(config: VidstreamConfig, catalog: Arc<VideoCatalog>) -> Result<Self, AccountError> {
        let filesystem = Arc::new(LocalFilesystem::new(config.storage.read_chunk_size));
        let orchestrator = StreamingOrchestrator::new(catalog.clone(), filesystem);
        Ok(Self {
            catalog,
            orchestrator,
            accounts: Arc::new(AccountStore::new(&config.auth)?),
            tokens: Arc::new(TokenIssuer::from_config(&config.auth)),
            config: Arc::new(config),
        })
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .storage
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/videos", get(list_videos).post(upload_video))
        .route(
            "/videos/{video_id}",
            get(get_video).patch(patch_video).delete(delete_video),
        )
        .route("/videos/{video_id}/stream", get(stream_video))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API on an already bound listener until it fails.
///
/// # Errors
/// - `std::io::Error` - Accepting connections failed
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state)).await
}

/// Start the server described by `config` and run until Ctrl-C.
///
/// # Errors
/// - `Box<dyn std::error::Error>` - Invalid configuration, uploads directory
///   not creatable, or the listener could not be bound
pub async fn run_server(config: VidstreamConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    tokio::fs::create_dir_all(&config.storage.uploads_dir).await?;

    let address = config.server.bind_address()?;
    let listener = TcpListener::bind(address).await?;
    info!(
        "Vidstream API listening on http://{} (uploads in {})",
        listener.local_addr()?,
        config.storage.uploads_dir.display()
    );

    let state = AppState::new(config, Arc::new(VideoCatalog::new()))?;
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Vidstream API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
