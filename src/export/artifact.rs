//! Versioned model artifact
//!
//! File layout: 8-byte magic tag, little-endian `u32` format version, then the
//! bincode-encoded [`ModelArtifact`]. Writes go to a temporary file in the
//! destination directory which is synced and renamed over the destination,
//! so a failed write never replaces a good artifact.

use crate::error::{EstimatorError, Result};
use crate::pipeline::FittedPipeline;
use crate::training::{RegressionMetrics, TrainingConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const ARTIFACT_MAGIC: [u8; 8] = *b"PROPEST\0";
pub const FORMAT_VERSION: u32 = 1;

/// Descriptive header stored alongside the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub format_version: u32,
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
    pub n_training_rows: usize,
    pub feature_names: Vec<String>,
    pub config: TrainingConfig,
    pub training_metrics: RegressionMetrics,
}

/// The serialized result of one training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub pipeline: FittedPipeline,
}

impl ModelArtifact {
    pub fn new(pipeline: FittedPipeline) -> Self {
        let metadata = ArtifactMetadata {
            format_version: FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            n_training_rows: pipeline.n_training_rows(),
            feature_names: pipeline.feature_names(),
            config: pipeline.config().clone(),
            training_metrics: *pipeline.training_metrics(),
        };
        Self { metadata, pipeline }
    }

    /// Encode to bytes, header included
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&ARTIFACT_MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::serialize_into(&mut bytes, self)?;
        Ok(bytes)
    }

    /// Decode bytes produced by [`ModelArtifact::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(bytes)
    }

    fn decode<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|_| EstimatorError::Serialization("artifact is truncated".to_string()))?;
        if magic != ARTIFACT_MAGIC {
            return Err(EstimatorError::Serialization(
                "not a property estimator artifact".to_string(),
            ));
        }

        let mut version = [0u8; 4];
        reader
            .read_exact(&mut version)
            .map_err(|_| EstimatorError::Serialization("artifact is truncated".to_string()))?;
        let version = u32::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(EstimatorError::Serialization(format!(
                "unsupported artifact format version {} (expected {})",
                version, FORMAT_VERSION
            )));
        }

        Ok(bincode::deserialize_from(reader)?)
    }

    /// Atomically write the artifact to `path`
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let temp_path = temp_path_for(path)?;
        if let Err(e) = write_synced(&temp_path, &bytes).and_then(|_| fs::rename(&temp_path, path)) {
            if temp_path.exists() {
                if let Err(cleanup) = fs::remove_file(&temp_path) {
                    warn!(path = %temp_path.display(), error = %cleanup, "Failed to remove temporary artifact");
                }
            }
            return Err(EstimatorError::Serialization(format!(
                "failed to write artifact {}: {}",
                path.display(),
                e
            )));
        }

        info!(
            path = %path.display(),
            bytes = bytes.len(),
            rows = self.metadata.n_training_rows,
            features = self.metadata.feature_names.len(),
            "Model artifact written"
        );
        Ok(())
    }

    /// Read an artifact written by [`ModelArtifact::write`]
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let artifact = Self::decode(BufReader::new(file))?;

        info!(
            path = %path.display(),
            created_at = %artifact.metadata.created_at.to_rfc3339(),
            crate_version = %artifact.metadata.crate_version,
            "Model artifact loaded"
        );
        Ok(artifact)
    }
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EstimatorError::Config(format!("invalid artifact path: {}", path.display())))?;
    Ok(path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id())))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()
}
