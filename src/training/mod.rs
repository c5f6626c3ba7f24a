//! Model training
//!
//! Provides the random forest regressor used to price properties:
//! - Regression trees split on squared-error reduction
//! - Bootstrap-aggregated forests with per-split feature sampling
//! - Regression metrics for reporting fit quality

mod config;
pub mod decision_tree;
pub mod metrics;
pub mod random_forest;

pub use config::TrainingConfig;
pub use decision_tree::{DecisionTree, TreeNode};
pub use metrics::RegressionMetrics;
pub use random_forest::{MaxFeatures, RandomForest};
