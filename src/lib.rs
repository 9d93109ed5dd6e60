//! Audio-to-feature pipeline and classifier inference for short breath recordings.
//!
//! A clip is decoded to mono, forced to a fixed duration, analysed into eight spectral and
//! time-domain feature matrices, summarized into a named feature vector, and classified by a
//! pre-trained model that is bound to that vector by column name.

/// Feature extraction stages and the feature-vector schema.
pub mod analysis;
/// Application directory helpers.
pub mod app_dirs;
/// Pipeline configuration.
pub mod config;
/// Inference error kinds.
pub mod error;
/// Tracing setup.
pub mod logging;
/// Model artifacts, classifiers, and the adapter.
pub mod ml;
/// End-to-end predictor.
pub mod pipeline;

pub use analysis::audio::{Waveform, load_waveform, load_waveform_from_bytes};
pub use analysis::duration::{NormalizedWaveform, normalize_duration};
pub use analysis::schema::{FeatureColumn, FeatureKind, FeatureSchema, FeatureStat};
pub use analysis::summary::{FeatureVector, summarize};
pub use analysis::{FeatureMatrix, FeatureSet, extract_features};
pub use config::{AnalysisConfig, ConfigError, PipelineConfig};
pub use error::{ErrorKind, InferenceError, SchemaMismatch};
pub use ml::{Classifier, ClassifierAdapter, ModelArtifact, ModelHandle, PredictionResult};
pub use pipeline::Predictor;
