//! JSON model artifact: metadata, training schema, and one model body.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Classifier;
use super::forest::RandomForest;
use super::gbdt_stump::GbdtStumps;
use super::logreg::LogisticRegression;
use crate::error::InferenceError;

/// Model family and parameters, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelBody {
    RandomForest(RandomForest),
    GbdtStump(GbdtStumps),
    LogisticRegression(LogisticRegression),
}

impl ModelBody {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelBody::RandomForest(_) => "random_forest",
            ModelBody::GbdtStump(_) => "gbdt_stump",
            ModelBody::LogisticRegression(_) => "logistic_regression",
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        match self {
            ModelBody::RandomForest(model) => model.validate(n_features, n_classes),
            ModelBody::GbdtStump(model) => model.validate(n_features, n_classes),
            ModelBody::LogisticRegression(model) => model.validate(n_features, n_classes),
        }
    }

    fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        match self {
            ModelBody::RandomForest(model) => model.predict_proba(features),
            ModelBody::GbdtStump(model) => model.predict_proba(features),
            ModelBody::LogisticRegression(model) => model.predict_proba(features),
        }
    }
}

/// A trained classifier plus the feature columns it was fit on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelArtifact {
    pub model_id: String,
    pub model_version: i64,
    /// Column names in the order the model consumes them.
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub model: ModelBody,
}

impl ModelArtifact {
    /// Validate structural invariants of the artifact and its body.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if let Some(dup) = first_duplicate(&self.classes) {
            return Err(format!("Duplicate class {dup:?}"));
        }
        if self.feature_names.is_empty() {
            return Err("Model must name at least one feature".to_string());
        }
        if let Some(dup) = first_duplicate(&self.feature_names) {
            return Err(format!("Duplicate feature name {dup:?}"));
        }
        self.model
            .validate(self.feature_names.len(), self.classes.len())
            .map_err(|err| format!("Invalid {} body: {err}", self.model.kind()))
    }

    /// Load and validate an artifact from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, InferenceError> {
        let bytes = std::fs::read(path)
            .map_err(|err| InferenceError::initialization(path, err.to_string()))?;
        let artifact: Self = serde_json::from_slice(&bytes)
            .map_err(|err| InferenceError::initialization(path, err.to_string()))?;
        artifact
            .validate()
            .map_err(|reason| InferenceError::initialization(path, reason))?;
        Ok(artifact)
    }

    /// Write the artifact as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_vec_pretty(self).map_err(|err| err.to_string())?;
        std::fs::write(path, json).map_err(|err| format!("Failed to write {}: {err}", path.display()))
    }
}

impl Classifier for ModelArtifact {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_proba(&self, features: &[f32]) -> Vec<f64> {
        self.model.predict_proba(features)
    }
}

fn first_duplicate(values: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    values
        .iter()
        .find(|value| !seen.insert(value.as_str()))
        .map(String::as_str)
}
