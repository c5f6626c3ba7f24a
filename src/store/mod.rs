//! Prediction persistence
//!
//! Every served estimate is written as a document to a [`PredictionStore`].
//! [`JsonLinesStore`] appends documents to a local collection file and
//! [`MemoryStore`] keeps them in process, which is what the tests use.

use crate::data::PropertyFeatures;
use crate::error::{EstimatorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Document persisted for each prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub location: String,
    pub size_sqft: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub amenities: String,
    pub predicted_price: f64,
    pub timestamp: DateTime<Utc>,
}

impl PredictionRecord {
    /// New document with a fresh id, stamped now
    pub fn new(features: &PropertyFeatures, predicted_price: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            location: features.location.clone(),
            size_sqft: features.size_sqft,
            bedrooms: features.bedrooms,
            bathrooms: features.bathrooms,
            amenities: features.amenities.clone(),
            predicted_price,
            timestamp: Utc::now(),
        }
    }
}

/// Destination for prediction documents
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist one document and return its id
    async fn save(&self, record: &PredictionRecord) -> Result<String>;

    /// Number of documents stored so far
    async fn count(&self) -> Result<usize>;

    /// Short label for logs and health output
    fn name(&self) -> &'static str;
}

/// Append-only collection of JSON documents, one per line
pub struct JsonLinesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored document back
    pub async fn load_all(&self) -> Result<Vec<PredictionRecord>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(EstimatorError::from))
            .collect()
    }
}

#[async_trait]
impl PredictionStore for JsonLinesStore {
    async fn save(&self, record: &PredictionRecord) -> Result<String> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EstimatorError::Store(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| EstimatorError::Store(format!("cannot open {}: {}", self.path.display(), e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| EstimatorError::Store(format!("cannot append to {}: {}", self.path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| EstimatorError::Store(e.to_string()))?;

        debug!(id = %record.id, path = %self.path.display(), "Prediction stored");
        Ok(record.id.clone())
    }

    async fn count(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents.lines().filter(|line| !line.trim().is_empty()).count()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(EstimatorError::Store(format!("cannot read {}: {}", self.path.display(), e))),
        }
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<PredictionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<PredictionRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn save(&self, record: &PredictionRecord) -> Result<String> {
        self.records.write().await.push(record.clone());
        Ok(record.id.clone())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(price: f64) -> PredictionRecord {
        PredictionRecord::new(&PropertyFeatures::new("X", 1000.0, 2, 1, "pool"), price)
    }

    #[test]
    fn test_record_json_fields() {
        let json = serde_json::to_value(record(1.5)).unwrap();
        assert_eq!(json["location"], "X");
        assert_eq!(json["bedrooms"], 2);
        assert_eq!(json["predicted_price"], 1.5);
        assert!(json["id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        let id = store.save(&record(10.0)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.records().await[0].id, id);
    }

    #[tokio::test]
    async fn test_jsonl_store_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesStore::new(dir.path().join("predictions").join("log.jsonl"));

        let first = record(100.0);
        let second = record(200.0);
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let all = store.load_all().await.unwrap();
        assert_eq!(all, vec![first, second]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_jsonl_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesStore::new(dir.path().join("none.jsonl"));
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
