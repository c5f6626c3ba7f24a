//! Property Estimator - property price estimation in Rust
//!
//! This crate fits and serves a price model for residential properties:
//! - One-hot encoding of `location` and `amenities` with numeric passthrough
//! - A seeded random forest regressor (100 trees, seed 42 by default)
//! - A versioned, atomically written model artifact
//! - An HTTP service that persists every prediction
//!
//! # Modules
//!
//! ## Core
//! - [`data`] - Typed property records and CSV/`DataFrame` loading
//! - [`preprocessing`] - One-hot encoder and feature transformer
//! - [`training`] - Decision trees, random forest, regression metrics
//! - [`pipeline`] - Encoder and forest composed into one fit/predict unit
//! - [`export`] - Model artifact format
//!
//! ## Services
//! - [`store`] - Prediction persistence
//! - [`server`] - HTTP server with form and JSON endpoints
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod data;
pub mod preprocessing;
pub mod training;
pub mod pipeline;
pub mod export;

// Services
pub mod store;
pub mod server;
pub mod cli;

pub use error::{EstimatorError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{EstimatorError, Result};

    // Records
    pub use crate::data::{PropertyFeatures, TrainingRecord, TrainingSet};

    // Preprocessing
    pub use crate::preprocessing::{FeatureTransformer, OneHotEncoder};

    // Training
    pub use crate::training::{MaxFeatures, RandomForest, RegressionMetrics, TrainingConfig};

    // Pipeline
    pub use crate::pipeline::{FittedPipeline, PricePipeline};

    // Export
    pub use crate::export::{ArtifactMetadata, ModelArtifact};

    // Persistence
    pub use crate::store::{JsonLinesStore, MemoryStore, PredictionRecord, PredictionStore};
}
