//! Encoder + forest composed into one fit/predict unit
//!
//! [`PricePipeline`] is the unfitted state and only carries configuration.
//! Fitting returns a new [`FittedPipeline`], the only type that can predict
//! or be written to an artifact. Callers never run the encoder and the forest
//! separately, so the training-time column layout is always the one used to
//! predict.

use crate::data::{self, PropertyFeatures, TrainingSet};
use crate::error::Result;
use crate::export::{ArtifactMetadata, ModelArtifact};
use crate::preprocessing::FeatureTransformer;
use crate::training::{RandomForest, RegressionMetrics, TrainingConfig};
use ndarray::Array1;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Unfitted pipeline
#[derive(Debug, Clone, Default)]
pub struct PricePipeline {
    config: TrainingConfig,
}

impl PricePipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit encoder and forest on a training set
    pub fn fit(&self, set: &TrainingSet) -> Result<FittedPipeline> {
        let start = Instant::now();
        self.config.validate()?;

        let transformer = FeatureTransformer::fit(&set.features)?;
        let x = transformer.transform(&set.features)?;

        let mut forest = self.config.build_forest();
        forest.fit(&x, &set.targets)?;

        let in_sample = forest.predict(&x)?;
        let training_metrics = RegressionMetrics::compute(&set.targets, &in_sample);

        info!(
            rows = set.len(),
            features = transformer.n_features(),
            trees = forest.n_trees(),
            seed = self.config.random_state,
            r2 = training_metrics.r2,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pipeline fitted"
        );

        Ok(FittedPipeline {
            config: self.config.clone(),
            transformer,
            forest,
            training_metrics,
            n_training_rows: set.len(),
            target_range: set.target_range(),
        })
    }

    /// Fit on a table holding exactly the five feature columns and `price`
    pub fn fit_frame(&self, df: &DataFrame) -> Result<FittedPipeline> {
        let set = data::training_set_from_frame(df)?;
        self.fit(&set)
    }

    /// Fit on a CSV file with a header row
    pub fn fit_csv(&self, path: impl AsRef<Path>) -> Result<FittedPipeline> {
        let df = data::load_csv(path)?;
        self.fit_frame(&df)
    }
}

/// Fitted pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPipeline {
    config: TrainingConfig,
    transformer: FeatureTransformer,
    forest: RandomForest,
    training_metrics: RegressionMetrics,
    n_training_rows: usize,
    target_range: (f64, f64),
}

impl FittedPipeline {
    /// One price per row, in row order
    ///
    /// Categories never seen during fitting encode as all zeros; they are
    /// logged at debug level and never rejected.
    pub fn predict(&self, rows: &[PropertyFeatures]) -> Result<Array1<f64>> {
        for row in rows {
            row.validate()?;
        }

        let (x, unseen) = self.transformer.transform_reporting(rows)?;
        for u in &unseen {
            debug!(row = u.row, column = %u.column, value = %u.value, "Unseen category encoded as zeros");
        }

        self.forest.predict(&x)
    }

    pub fn predict_one(&self, row: &PropertyFeatures) -> Result<f64> {
        let prices = self.predict(std::slice::from_ref(row))?;
        Ok(prices[0])
    }

    /// Predict on a table holding exactly the five feature columns, in any order
    pub fn predict_frame(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let rows = data::features_from_frame(df)?;
        self.predict(&rows)
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// In-sample metrics computed right after fitting
    pub fn training_metrics(&self) -> &RegressionMetrics {
        &self.training_metrics
    }

    pub fn n_training_rows(&self) -> usize {
        self.n_training_rows
    }

    /// Smallest and largest price seen in training
    pub fn target_range(&self) -> (f64, f64) {
        self.target_range
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.transformer.feature_names()
    }

    /// Encoded feature names paired with forest importances, most important first
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let Some(importances) = self.forest.feature_importances() else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names()
            .into_iter()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Write this pipeline to `path` as a versioned artifact
    pub fn save(&self, path: impl AsRef<Path>) -> Result<ArtifactMetadata> {
        let artifact = ModelArtifact::new(self.clone());
        artifact.write(path)?;
        Ok(artifact.metadata)
    }

    /// Read a pipeline written by [`FittedPipeline::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(ModelArtifact::read(path)?.pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TrainingRecord;

    fn example_set() -> TrainingSet {
        TrainingSet::from_records(&[
            TrainingRecord {
                location: "X".into(),
                size_sqft: 1000.0,
                bedrooms: 2,
                bathrooms: 1,
                amenities: "pool".into(),
                price: 200_000.0,
            },
            TrainingRecord {
                location: "Y".into(),
                size_sqft: 1500.0,
                bedrooms: 3,
                bathrooms: 2,
                amenities: "none".into(),
                price: 300_000.0,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_end_to_end_example() {
        let fitted = PricePipeline::default().fit(&example_set()).unwrap();
        let price = fitted
            .predict_one(&PropertyFeatures::new("X", 1000.0, 2, 1, "pool"))
            .unwrap();

        assert!(price.is_finite());
        assert!((200_000.0..=300_000.0).contains(&price), "price out of range: {}", price);
    }

    #[test]
    fn test_unseen_location_predicts() {
        let fitted = PricePipeline::default().fit(&example_set()).unwrap();
        let price = fitted
            .predict_one(&PropertyFeatures::new("C", 1200.0, 2, 1, "gym"))
            .unwrap();
        assert!(price.is_finite());
    }

    #[test]
    fn test_refit_is_independent() {
        let pipeline = PricePipeline::new(TrainingConfig::new().with_n_estimators(10));
        let first = pipeline.fit(&example_set()).unwrap();
        let snapshot = first.clone();
        let _second = pipeline.fit(&example_set()).unwrap();
        assert_eq!(first, snapshot);
    }

    #[test]
    fn test_invalid_config_rejected_before_fit() {
        let pipeline = PricePipeline::new(TrainingConfig::new().with_n_estimators(0));
        assert!(pipeline.fit(&example_set()).is_err());
    }

    #[test]
    fn test_feature_importances_cover_every_feature() {
        let fitted = PricePipeline::default().fit(&example_set()).unwrap();
        let ranked = fitted.feature_importances();
        assert_eq!(ranked.len(), fitted.transformer().n_features());
    }
}
