//! Column transformer: numeric passthrough followed by one-hot blocks

use super::encoder::OneHotEncoder;
use crate::data::{PropertyFeatures, CATEGORICAL_COLUMNS, NUMERICAL_COLUMNS};
use crate::error::{EstimatorError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Fitted feature transformer
///
/// Output layout is `[size_sqft, bedrooms, bathrooms, location_*, amenities_*]`.
/// The layout is fixed at fit time and serialized with the transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTransformer {
    encoders: Vec<OneHotEncoder>,
}

/// A categorical value that had no indicator position at transform time
#[derive(Debug, Clone, PartialEq)]
pub struct UnseenCategory {
    pub row: usize,
    pub column: String,
    pub value: String,
}

impl FeatureTransformer {
    /// Learn the categories of every categorical column
    pub fn fit(rows: &[PropertyFeatures]) -> Result<Self> {
        if rows.is_empty() {
            return Err(EstimatorError::Data(
                "cannot fit encoder on zero rows".to_string(),
            ));
        }

        let encoders = CATEGORICAL_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| OneHotEncoder::fit(*column, rows.iter().map(|r| r.categorical()[i])))
            .collect();

        Ok(Self { encoders })
    }

    /// Total width of the encoded matrix
    pub fn n_features(&self) -> usize {
        NUMERICAL_COLUMNS.len() + self.encoders.iter().map(OneHotEncoder::width).sum::<usize>()
    }

    pub fn encoders(&self) -> &[OneHotEncoder] {
        &self.encoders
    }

    pub fn feature_names(&self) -> Vec<String> {
        NUMERICAL_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.encoders.iter().flat_map(OneHotEncoder::feature_names))
            .collect()
    }

    pub fn transform(&self, rows: &[PropertyFeatures]) -> Result<Array2<f64>> {
        Ok(self.transform_reporting(rows)?.0)
    }

    /// Transform and also report every categorical value that fell back to zeros
    pub fn transform_reporting(
        &self,
        rows: &[PropertyFeatures],
    ) -> Result<(Array2<f64>, Vec<UnseenCategory>)> {
        let n_features = self.n_features();
        let mut flat = vec![0.0; rows.len() * n_features];
        let mut unseen = Vec::new();

        for (i, (row, out)) in rows.iter().zip(flat.chunks_mut(n_features)).enumerate() {
            let numerical = row.numerical();
            out[..numerical.len()].copy_from_slice(&numerical);

            let mut offset = numerical.len();
            for (encoder, value) in self.encoders.iter().zip(row.categorical()) {
                let width = encoder.width();
                if !encoder.encode_into(value, &mut out[offset..offset + width]) {
                    unseen.push(UnseenCategory {
                        row: i,
                        column: encoder.column().to_string(),
                        value: value.to_string(),
                    });
                }
                offset += width;
            }
        }

        let x = Array2::from_shape_vec((rows.len(), n_features), flat)?;
        Ok((x, unseen))
    }
}
