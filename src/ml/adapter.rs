//! Name-bound bridge between feature vectors and a classifier.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{Classifier, argmax};
use crate::analysis::summary::FeatureVector;
use crate::error::{InferenceError, SchemaMismatch};

/// Allowed deviation of the probability sum from 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-6;

/// Predicted label and the full class distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: String,
    pub top_probability: f64,
    pub all_probabilities: BTreeMap<String, f64>,
}

impl PredictionResult {
    /// Build a result from class-aligned probabilities, checking they form a distribution.
    pub fn from_probabilities(
        classes: &[String],
        probabilities: &[f64],
    ) -> Result<Self, InferenceError> {
        if classes.is_empty() || classes.len() != probabilities.len() {
            return Err(InferenceError::Computation(format!(
                "model returned {} probabilities for {} classes",
                probabilities.len(),
                classes.len()
            )));
        }
        if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(InferenceError::Computation(format!(
                "model returned invalid probabilities {probabilities:?}"
            )));
        }
        let sum: f64 = probabilities.iter().sum();
        if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(InferenceError::Computation(format!(
                "probabilities sum to {sum}, expected 1"
            )));
        }
        let best = argmax(probabilities);
        Ok(Self {
            label: classes[best].clone(),
            top_probability: probabilities[best],
            all_probabilities: classes
                .iter()
                .cloned()
                .zip(probabilities.iter().copied())
                .collect(),
        })
    }
}

/// Validates feature vectors against a classifier's recorded columns before predicting.
pub struct ClassifierAdapter<'a, C: Classifier + ?Sized> {
    model: &'a C,
}

impl<'a, C: Classifier + ?Sized> ClassifierAdapter<'a, C> {
    pub fn new(model: &'a C) -> Self {
        Self { model }
    }

    /// Reorder `vector` into the model's column order.
    ///
    /// Fails when names or counts differ; positions alone are never trusted.
    pub fn bind(&self, vector: &FeatureVector) -> Result<Vec<f32>, InferenceError> {
        let expected = self.model.feature_names();
        let names = vector.names();
        let values = vector.values();
        let by_name: HashMap<&str, f32> = names
            .iter()
            .map(String::as_str)
            .zip(values.iter().copied())
            .collect();

        let missing: Vec<String> = expected
            .iter()
            .filter(|name| !by_name.contains_key(name.as_str()))
            .cloned()
            .collect();
        let unexpected: Vec<String> = names
            .iter()
            .filter(|name| !expected.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() || expected.len() != names.len() {
            return Err(InferenceError::SchemaMismatch(SchemaMismatch {
                expected_len: expected.len(),
                actual_len: names.len(),
                missing,
                unexpected,
            }));
        }

        Ok(expected
            .iter()
            .filter_map(|name| by_name.get(name.as_str()).copied())
            .collect())
    }

    /// Bind the vector and return the predicted label with all class probabilities.
    pub fn classify(&self, vector: &FeatureVector) -> Result<PredictionResult, InferenceError> {
        let inputs = self.bind(vector)?;
        let probabilities = self.model.predict_proba(&inputs);
        PredictionResult::from_probabilities(self.model.classes(), &probabilities)
    }
}
