//! Prediction service
//!
//! Loads one model artifact at startup and serves price estimates over HTTP.
//! Every estimate is persisted to the configured prediction store.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use state::AppState;

use crate::export::ModelArtifact;
use crate::store::JsonLinesStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Artifact written by the `train` command
    pub model_path: PathBuf,
    /// JSON-lines collection receiving one document per prediction
    pub predictions_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            model_path: std::env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("model/model.bin")),
            predictions_path: std::env::var("PREDICTIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/predictions.jsonl")),
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let artifact = ModelArtifact::read(&config.model_path).map_err(|e| {
        anyhow::anyhow!("cannot load model artifact {}: {}", config.model_path.display(), e)
    })?;
    info!(
        model = %config.model_path.display(),
        trained_at = %artifact.metadata.created_at.to_rfc3339(),
        rows = artifact.metadata.n_training_rows,
        features = artifact.metadata.feature_names.len(),
        "Model loaded"
    );

    let store = Arc::new(JsonLinesStore::new(config.predictions_path.clone()));
    info!(path = %store.path().display(), "Prediction store ready");

    let state = Arc::new(AppState::new(config.clone(), artifact, store));
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        started_at = %start_time.to_rfc3339(),
        "Property estimator server starting"
    );
    info!(url = %format!("http://{}", addr), "Web form available");
    info!(url = %format!("http://{}/api/health", addr), "Health endpoint available");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening");

    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(uptime_secs = uptime.num_seconds(), "Shutdown signal received, stopping server");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}
