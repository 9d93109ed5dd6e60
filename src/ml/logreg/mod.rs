//! Multinomial logistic regression over standardized features.

use serde::{Deserialize, Serialize};

use crate::ml::softmax;

/// Linear model with per-feature standardization.
///
/// `weights` is row-major `[rows][n_features]`. A two-class model may store a single row,
/// in which case the row scores the second class against the first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogisticRegression {
    pub feature_mean: Vec<f32>,
    pub feature_scale: Vec<f32>,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl LogisticRegression {
    fn rows(&self) -> usize {
        self.bias.len()
    }

    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.feature_mean.len() != n_features {
            return Err("feature_mean length mismatch".to_string());
        }
        if self.feature_scale.len() != n_features {
            return Err("feature_scale length mismatch".to_string());
        }
        if self
            .feature_scale
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err("feature_scale entries must be > 0".to_string());
        }
        let rows = self.rows();
        let binary = n_classes == 2 && rows == 1;
        if rows != n_classes && !binary {
            return Err(format!(
                "bias has {rows} rows but there are {n_classes} classes"
            ));
        }
        if self.weights.len() != rows * n_features {
            return Err("weights length mismatch".to_string());
        }
        if self
            .weights
            .iter()
            .chain(&self.bias)
            .chain(&self.feature_mean)
            .any(|v| !v.is_finite())
        {
            return Err("parameters contain non-finite values".to_string());
        }
        Ok(())
    }

    pub fn decision_function(&self, features: &[f32]) -> Vec<f64> {
        let n_features = self.feature_mean.len();
        let standardized: Vec<f64> = (0..n_features)
            .map(|i| {
                let x = features.get(i).copied().unwrap_or(0.0) as f64;
                (x - self.feature_mean[i] as f64) / self.feature_scale[i] as f64
            })
            .collect();
        self.weights
            .chunks(n_features.max(1))
            .zip(&self.bias)
            .map(|(row, bias)| {
                row.iter()
                    .zip(&standardized)
                    .map(|(w, x)| *w as f64 * x)
                    .sum::<f64>()
                    + *bias as f64
            })
            .collect()
    }

    pub fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        let logits = self.decision_function(features);
        if logits.len() == 1 {
            let p = 1.0 / (1.0 + (-logits[0]).exp());
            return vec![1.0 - p, p];
        }
        softmax(&logits)
    }
}
