//! Application state shared across handlers

use crate::export::{ArtifactMetadata, ModelArtifact};
use crate::pipeline::FittedPipeline;
use crate::store::PredictionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::ServerConfig;

/// Built once at startup and read-only afterwards
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: FittedPipeline,
    pub metadata: ArtifactMetadata,
    pub store: Arc<dyn PredictionStore>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, artifact: ModelArtifact, store: Arc<dyn PredictionStore>) -> Self {
        Self {
            config,
            pipeline: artifact.pipeline,
            metadata: artifact.metadata,
            store,
            started_at: Utc::now(),
        }
    }
}
