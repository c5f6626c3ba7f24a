//! Typed property records

use crate::error::{EstimatorError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

pub const LOCATION: &str = "location";
pub const SIZE_SQFT: &str = "size_sqft";
pub const BEDROOMS: &str = "bedrooms";
pub const BATHROOMS: &str = "bathrooms";
pub const AMENITIES: &str = "amenities";
pub const PRICE: &str = "price";

/// Passthrough columns, in feature-matrix order
pub const NUMERICAL_COLUMNS: [&str; 3] = [SIZE_SQFT, BEDROOMS, BATHROOMS];

/// One-hot encoded columns, in feature-matrix order
pub const CATEGORICAL_COLUMNS: [&str; 2] = [LOCATION, AMENITIES];

/// Every input column a prediction needs
pub const FEATURE_COLUMNS: [&str; 5] = [LOCATION, SIZE_SQFT, BEDROOMS, BATHROOMS, AMENITIES];

pub const TARGET_COLUMN: &str = PRICE;

/// Inputs for a single price estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyFeatures {
    pub location: String,
    pub size_sqft: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub amenities: String,
}

impl PropertyFeatures {
    pub fn new(
        location: impl Into<String>,
        size_sqft: f64,
        bedrooms: u32,
        bathrooms: u32,
        amenities: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            size_sqft,
            bedrooms,
            bathrooms,
            amenities: amenities.into(),
        }
    }

    /// Values for [`NUMERICAL_COLUMNS`]
    pub fn numerical(&self) -> [f64; 3] {
        [self.size_sqft, self.bedrooms as f64, self.bathrooms as f64]
    }

    /// Values for [`CATEGORICAL_COLUMNS`]
    pub fn categorical(&self) -> [&str; 2] {
        [self.location.as_str(), self.amenities.as_str()]
    }

    pub fn validate(&self) -> Result<()> {
        if !self.size_sqft.is_finite() {
            return Err(EstimatorError::Data(format!(
                "{} must be a finite number, got {}",
                SIZE_SQFT, self.size_sqft
            )));
        }
        Ok(())
    }
}

/// A labelled row of training data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingRecord {
    pub location: String,
    pub size_sqft: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub amenities: String,
    pub price: f64,
}

impl TrainingRecord {
    pub fn features(&self) -> PropertyFeatures {
        PropertyFeatures {
            location: self.location.clone(),
            size_sqft: self.size_sqft,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            amenities: self.amenities.clone(),
        }
    }
}

/// Feature rows paired with their targets
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Vec<PropertyFeatures>,
    pub targets: Array1<f64>,
}

impl TrainingSet {
    pub fn new(features: Vec<PropertyFeatures>, targets: Vec<f64>) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(EstimatorError::Shape {
                expected: format!("{} targets", features.len()),
                actual: format!("{} targets", targets.len()),
            });
        }
        if features.is_empty() {
            return Err(EstimatorError::Data("training data has zero rows".to_string()));
        }
        if let Some(row) = targets.iter().position(|t| !t.is_finite()) {
            return Err(EstimatorError::Data(format!(
                "target column '{}' has a missing or non-numeric value at row {}",
                TARGET_COLUMN, row
            )));
        }
        for row in &features {
            row.validate()?;
        }

        Ok(Self {
            features,
            targets: Array1::from_vec(targets),
        })
    }

    pub fn from_records(records: &[TrainingRecord]) -> Result<Self> {
        let features = records.iter().map(TrainingRecord::features).collect();
        let targets = records.iter().map(|r| r.price).collect();
        Self::new(features, targets)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Smallest and largest observed target
    pub fn target_range(&self) -> (f64, f64) {
        self.targets.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| {
            (lo.min(t), hi.max(t))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_reject_unknown_fields() {
        let json = r#"{"location":"X","size_sqft":1000,"bedrooms":2,"bathrooms":1,"amenities":"pool","garage":true}"#;
        assert!(serde_json::from_str::<PropertyFeatures>(json).is_err());
    }

    #[test]
    fn test_features_reject_missing_fields() {
        let json = r#"{"location":"X","size_sqft":1000,"bedrooms":2,"amenities":"pool"}"#;
        assert!(serde_json::from_str::<PropertyFeatures>(json).is_err());
    }

    #[test]
    fn test_numerical_order() {
        let row = PropertyFeatures::new("X", 1000.0, 2, 1, "pool");
        assert_eq!(row.numerical(), [1000.0, 2.0, 1.0]);
        assert_eq!(row.categorical(), ["X", "pool"]);
    }

    #[test]
    fn test_training_set_rejects_empty() {
        let err = TrainingSet::new(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, EstimatorError::Data(_)));
    }

    #[test]
    fn test_training_set_rejects_nan_target() {
        let rows = vec![PropertyFeatures::new("X", 1000.0, 2, 1, "pool")];
        let err = TrainingSet::new(rows, vec![f64::NAN]).unwrap_err();
        assert!(matches!(err, EstimatorError::Data(_)));
    }

    #[test]
    fn test_training_set_rejects_length_mismatch() {
        let rows = vec![PropertyFeatures::new("X", 1000.0, 2, 1, "pool")];
        let err = TrainingSet::new(rows, vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, EstimatorError::Shape { .. }));
    }

    #[test]
    fn test_target_range() {
        let records = vec![
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
        ];
        let set = TrainingSet::from_records(&records).unwrap();
        assert_eq!(set.target_range(), (200_000.0, 300_000.0));
    }
}
