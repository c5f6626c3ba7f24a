//! Regression metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Goodness of fit on a set of predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub n_samples: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len().max(1) as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse: f64 = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae: f64 = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self {
            n_samples: y_true.len(),
            mse,
            rmse: mse.sqrt(),
            mae,
            r2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_fit() {
        let y = array![1.0, 2.0, 3.0];
        let m = RegressionMetrics::compute(&y, &y);
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.r2, 1.0);
    }

    #[test]
    fn test_errors() {
        let y_true = array![1.0, 2.0, 3.0, 4.0];
        let y_pred = array![2.0, 2.0, 3.0, 2.0];
        let m = RegressionMetrics::compute(&y_true, &y_pred);
        assert_eq!(m.n_samples, 4);
        assert!((m.mse - 1.25).abs() < 1e-12);
        assert!((m.mae - 0.75).abs() < 1e-12);
        assert!((m.r2 - 0.0).abs() < 1e-12);
    }
}
