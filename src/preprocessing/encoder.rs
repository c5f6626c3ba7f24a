//! One-hot encoding for a single categorical column

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder fitted on one column
///
/// Categories are stored sorted, and each owns one indicator position. A
/// value that was not seen during fitting encodes to the all-zero block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    column: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    /// Fit on every value observed for `column`
    pub fn fit<'a>(column: impl Into<String>, values: impl IntoIterator<Item = &'a str>) -> Self {
        let categories: BTreeSet<&str> = values.into_iter().collect();
        Self {
            column: column.into(),
            categories: categories.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Number of indicator columns produced
    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Indicator position of `value`, if it was seen during fitting
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Write the indicator block for `value` into `out`
    ///
    /// `out` must be `width()` long. Returns false when the value is unseen,
    /// in which case the block stays all zero.
    pub fn encode_into(&self, value: &str, out: &mut [f64]) -> bool {
        debug_assert_eq!(out.len(), self.width());
        out.iter_mut().for_each(|v| *v = 0.0);
        match self.position(value) {
            Some(idx) => {
                out[idx] = 1.0;
                true
            }
            None => false,
        }
    }

    /// Names of the indicator columns, `<column>_<category>`
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", self.column, c))
            .collect()
    }
}
