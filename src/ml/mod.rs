//! Pre-trained classifiers and the glue that feeds them feature vectors.
//!
//! Models are loaded from JSON artifacts that record the class list and the feature columns
//! they were fit on. Every model exposes the same [`Classifier`] surface so the adapter and
//! orchestrator never depend on the model family.

pub mod adapter;
pub mod artifact;
pub mod forest;
pub mod gbdt_stump;
pub mod handle;
pub mod logreg;

pub use adapter::{ClassifierAdapter, PredictionResult};
pub use artifact::{ModelArtifact, ModelBody};
pub use handle::ModelHandle;

/// Read-only multiclass classifier over a fixed, named feature layout.
pub trait Classifier: Send + Sync {
    /// Class labels in probability order.
    fn classes(&self) -> &[String];

    /// Feature column names in the order `predict_proba` expects values.
    fn feature_names(&self) -> &[String];

    /// Probability per class, aligned with [`Classifier::classes`].
    fn predict_proba(&self, features: &[f32]) -> Vec<f64>;

    /// Index of the most probable class; ties resolve to the lowest index.
    fn predict(&self, features: &[f32]) -> usize {
        argmax(&self.predict_proba(features))
    }
}

/// Compute a numerically-stable softmax for a set of logits.
pub fn softmax(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = raw.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if !(sum > 0.0 && sum.is_finite()) {
        return vec![1.0 / raw.len() as f64; raw.len()];
    }
    exps.into_iter().map(|v| v / sum).collect()
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn softmax_sums_to_one_and_is_shift_invariant() {
        let a = softmax(&[1.0, 2.0, 3.0]);
        let b = softmax(&[1001.0, 1002.0, 1003.0]);
        assert!((a.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
        assert!(softmax(&[]).is_empty());
    }

    #[test]
    fn argmax_prefers_first_of_equal_values() {
        assert_eq!(argmax(&[0.25, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }
}
