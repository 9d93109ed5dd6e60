//! Reduce feature matrices to the fixed-schema vector a model consumes.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::FeatureSet;
use super::schema::{FeatureColumn, FeatureKind, FeatureSchema, FeatureStat};
use crate::error::InferenceError;

/// Summary statistics over every element of one matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixStats {
    pub mean: f64,
    pub std: f64,
    pub max: f64,
    pub min: f64,
}

impl MatrixStats {
    /// Accumulates in `f64`; `std` is the population standard deviation.
    pub fn from_values<'a>(values: impl IntoIterator<Item = &'a f32>) -> Option<Self> {
        let values: Vec<f64> = values.into_iter().map(|v| *v as f64).collect();
        if values.is_empty() {
            return None;
        }
        let count = values.len() as f64;
        let (sum, max, min) = values.iter().fold(
            (0.0_f64, f64::NEG_INFINITY, f64::INFINITY),
            |(sum, max, min), &v| (sum + v, max.max(v), min.min(v)),
        );
        let mean = sum / count;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
        Some(Self {
            mean,
            std: variance.sqrt(),
            max,
            min,
        })
    }

    pub fn get(&self, stat: FeatureStat) -> f64 {
        match stat {
            FeatureStat::Mean => self.mean,
            FeatureStat::Std => self.std,
            FeatureStat::Max => self.max,
            FeatureStat::Min => self.min,
        }
    }
}

/// Named feature values in schema order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    entries: Vec<(FeatureColumn, f32)>,
}

impl FeatureVector {
    pub fn get(&self, name: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(column, _)| column.name() == name)
            .map(|(_, value)| *value)
    }

    pub fn columns(&self) -> impl Iterator<Item = FeatureColumn> + '_ {
        self.entries.iter().map(|(column, _)| *column)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(column, _)| column.name()).collect()
    }

    pub fn values(&self) -> Vec<f32> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, value) in &self.entries {
            map.serialize_entry(&column.name(), value)?;
        }
        map.end()
    }
}

/// Summarize each matrix and lay the statistics out in `schema` order.
pub fn summarize(features: &FeatureSet, schema: &FeatureSchema) -> Result<FeatureVector, InferenceError> {
    let mut stats: Vec<(FeatureKind, MatrixStats)> = Vec::with_capacity(features.len());
    for matrix in features.iter() {
        let summary = MatrixStats::from_values(matrix.values().iter()).ok_or_else(|| {
            InferenceError::Computation(format!("{} matrix is empty", matrix.name()))
        })?;
        stats.push((matrix.kind(), summary));
    }

    let mut entries = Vec::with_capacity(schema.len());
    for &column in schema.columns() {
        let summary = stats
            .iter()
            .find(|(kind, _)| *kind == column.kind)
            .map(|(_, summary)| summary)
            .ok_or_else(|| {
                InferenceError::Computation(format!("no {} matrix was computed", column.kind.name()))
            })?;
        let value = summary.get(column.stat) as f32;
        if !value.is_finite() {
            return Err(InferenceError::Computation(format!(
                "{column} is not finite ({value})"
            )));
        }
        entries.push((column, value));
    }
    tracing::debug!("Summarized {} columns", entries.len());
    Ok(FeatureVector { entries })
}

#[cfg(test)]
pub(crate) fn vector_from_pairs(pairs: &[(&str, f32)]) -> FeatureVector {
    let entries = pairs
        .iter()
        .filter_map(|(name, value)| FeatureColumn::parse(name).map(|column| (column, *value)))
        .collect();
    FeatureVector { entries }
}
