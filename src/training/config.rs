//! Training configuration

use super::random_forest::{MaxFeatures, RandomForest};
use crate::error::{EstimatorError, Result};
use serde::{Deserialize, Serialize};

/// Estimator constants for one training run
///
/// The defaults reproduce the production model: 100 trees seeded with 42.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of trees
    pub n_estimators: usize,

    /// Random seed for reproducibility
    pub random_state: u64,

    /// Maximum depth of trees
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node
    pub min_samples_split: usize,

    /// Minimum samples per leaf
    pub min_samples_leaf: usize,

    /// Features drawn at every split
    pub max_features: MaxFeatures,

    /// Whether each tree sees a bootstrap resample
    pub bootstrap: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_state: 42,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            bootstrap: true,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, n: usize) -> Self {
        self.min_samples_split = n;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(EstimatorError::Config("n_estimators must be at least 1".to_string()));
        }
        if self.min_samples_split < 2 {
            return Err(EstimatorError::Config("min_samples_split must be at least 2".to_string()));
        }
        if self.min_samples_leaf == 0 {
            return Err(EstimatorError::Config("min_samples_leaf must be at least 1".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(EstimatorError::Config("max_depth must be at least 1".to_string()));
        }
        match self.max_features {
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => Err(EstimatorError::Config(
                format!("max_features fraction must be in (0, 1], got {}", f),
            )),
            MaxFeatures::Fixed(0) => Err(EstimatorError::Config(
                "max_features must be at least 1".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Unfitted forest carrying these constants
    pub fn build_forest(&self) -> RandomForest {
        let mut forest = RandomForest::new_regressor(self.n_estimators)
            .with_random_state(self.random_state)
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(self.max_features)
            .with_bootstrap(self.bootstrap);
        if let Some(depth) = self.max_depth {
            forest = forest.with_max_depth(depth);
        }
        forest
    }
}
