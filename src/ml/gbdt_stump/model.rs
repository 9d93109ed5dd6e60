use serde::{Deserialize, Serialize};

use crate::ml::softmax;

/// Single-node decision tree used as a weak learner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stump {
    /// Feature index used for the split.
    pub feature_index: u16,
    /// Threshold in feature units.
    pub threshold: f32,
    /// Prediction for `feature <= threshold`.
    pub left_value: f32,
    /// Prediction for `feature > threshold`.
    pub right_value: f32,
}

impl Stump {
    /// Predict the stump value for a feature vector.
    pub fn predict(&self, features: &[f32]) -> f32 {
        let idx = self.feature_index as usize;
        let value = features.get(idx).copied().unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Gradient-boosted decision stumps with one stump per class per round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtStumps {
    /// Learning rate applied to each stump prediction.
    pub learning_rate: f32,
    /// Initial raw logits before boosting rounds.
    pub init_raw: Vec<f32>,
    /// Shape: `[n_rounds][n_classes]`.
    pub stumps: Vec<Vec<Stump>>,
}

impl GbdtStumps {
    /// Validate structural invariants against the artifact's feature and class counts.
    pub fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be > 0".to_string());
        }
        if self.init_raw.len() != n_classes {
            return Err(format!(
                "init_raw has {} entries but there are {n_classes} classes",
                self.init_raw.len()
            ));
        }
        if self.init_raw.iter().any(|v| !v.is_finite()) {
            return Err("init_raw contains non-finite values".to_string());
        }
        for (round_idx, round) in self.stumps.iter().enumerate() {
            if round.len() != n_classes {
                return Err(format!(
                    "Round {round_idx} has {} stumps but expected {n_classes}",
                    round.len()
                ));
            }
            for stump in round {
                if stump.feature_index as usize >= n_features {
                    return Err(format!(
                        "Round {round_idx} splits on feature {} but only {n_features} exist",
                        stump.feature_index
                    ));
                }
                if !(stump.threshold.is_finite()
                    && stump.left_value.is_finite()
                    && stump.right_value.is_finite())
                {
                    return Err(format!("Round {round_idx} has a non-finite stump"));
                }
            }
        }
        Ok(())
    }

    /// Predict raw logits for a feature vector.
    pub fn predict_raw(&self, features: &[f32]) -> Vec<f64> {
        let mut raw: Vec<f64> = self.init_raw.iter().map(|v| *v as f64).collect();
        for round in &self.stumps {
            for (class_idx, stump) in round.iter().enumerate() {
                raw[class_idx] += self.learning_rate as f64 * stump.predict(features) as f64;
            }
        }
        raw
    }

    /// Predict class probabilities for a feature vector.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        softmax(&self.predict_raw(features))
    }
}
