//! Error kinds surfaced by the inference pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of one inference run.
///
/// The orchestrator returns the first failure verbatim; callers map [`ErrorKind`] onto
/// whatever status scheme their transport uses.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The audio input is missing, unreadable, or not a decodable stream.
    #[error("Audio decode failed for {path}: {reason}")]
    Decode {
        /// Input that failed to decode.
        path: PathBuf,
        /// Decoder or IO message.
        reason: String,
    },
    /// The model artifact is missing or corrupt.
    #[error("Model initialization failed for {path}: {reason}")]
    Initialization {
        /// Model artifact path.
        path: PathBuf,
        /// Load or validation message.
        reason: String,
    },
    /// The feature vector does not match the schema the model was fit on.
    #[error("Feature schema mismatch: {0}")]
    SchemaMismatch(SchemaMismatch),
    /// Numeric failure while computing features or probabilities.
    #[error("Feature computation failed: {0}")]
    Computation(String),
}

/// Copyable tag for [`InferenceError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`InferenceError::Decode`].
    Decode,
    /// See [`InferenceError::Initialization`].
    Initialization,
    /// See [`InferenceError::SchemaMismatch`].
    SchemaMismatch,
    /// See [`InferenceError::Computation`].
    Computation,
}

impl InferenceError {
    /// Return the kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InferenceError::Decode { .. } => ErrorKind::Decode,
            InferenceError::Initialization { .. } => ErrorKind::Initialization,
            InferenceError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            InferenceError::Computation(_) => ErrorKind::Computation,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        InferenceError::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn initialization(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        InferenceError::Initialization {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Column-level description of a schema mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    /// Number of columns the model expects.
    pub expected_len: usize,
    /// Number of columns the vector carries.
    pub actual_len: usize,
    /// Columns the model expects but the vector lacks.
    pub missing: Vec<String>,
    /// Columns the vector carries but the model does not know.
    pub unexpected: Vec<String>,
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model expects {} columns, vector has {}",
            self.expected_len, self.actual_len
        )?;
        if !self.missing.is_empty() {
            write!(f, "; missing [{}]", self.missing.join(", "))?;
        }
        if !self.unexpected.is_empty() {
            write!(f, "; unexpected [{}]", self.unexpected.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = InferenceError::decode("a.wav", "boom");
        assert_eq!(err.kind(), ErrorKind::Decode);
        let err = InferenceError::initialization("m.json", "missing");
        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert_eq!(
            InferenceError::Computation("nan".into()).kind(),
            ErrorKind::Computation
        );
    }

    #[test]
    fn schema_mismatch_lists_columns() {
        let mismatch = SchemaMismatch {
            expected_len: 2,
            actual_len: 1,
            missing: vec!["mfcc_std".into()],
            unexpected: vec![],
        };
        let text = InferenceError::SchemaMismatch(mismatch).to_string();
        assert!(text.contains("expects 2 columns"));
        assert!(text.contains("missing [mfcc_std]"));
        assert!(!text.contains("unexpected"));
    }
}
