//! Property records and tabular input
//!
//! - [`record`] - typed feature/training rows and column names
//! - [`frame`] - CSV loading and name-based extraction from polars tables

pub mod frame;
pub mod record;

pub use frame::{features_from_frame, load_csv, training_set_from_frame};
pub use record::{
    PropertyFeatures, TrainingRecord, TrainingSet, AMENITIES, BATHROOMS, BEDROOMS,
    CATEGORICAL_COLUMNS, FEATURE_COLUMNS, LOCATION, NUMERICAL_COLUMNS, PRICE, SIZE_SQFT,
    TARGET_COLUMN,
};
