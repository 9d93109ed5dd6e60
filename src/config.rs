//! Pipeline configuration shared between training and inference.
//!
//! Every value here must equal the value used when the model was fit. The defaults are the
//! training-time constants; a TOML file may override them for models trained differently.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::schema::FeatureColumn;
use crate::app_dirs;

/// File name of the optional pipeline config inside the application directory.
pub const CONFIG_FILE_NAME: &str = app_dirs::PIPELINE_CONFIG_FILE;

/// Clip length the model was trained on.
pub const DEFAULT_TARGET_DURATION_SECONDS: f64 = 7.8560090702947845;
/// Rate every input is resampled to before analysis.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;
/// Columns dropped from the feature vector at training time.
pub const DEFAULT_EXCLUDED_COLUMNS: &[&str] = &["mel_spectrogram_min", "chroma_stft_max"];

/// Errors that may occur while loading or validating pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize config to TOML.
    #[error("Failed to serialize config to TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    /// A value is outside its valid range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        /// Dotted field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// An excluded column does not name any known feature statistic.
    #[error("Unknown excluded feature column {0:?}")]
    UnknownExcludedColumn(String),
    /// No usable application directory.
    #[error("No suitable config directory found: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
}

/// Window applied to each analysis frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    /// Periodic Hann window.
    Hann,
    /// No tapering.
    Rectangular,
}

/// Frame and filterbank parameters shared by every analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    pub window: WindowKind,
    pub n_mels: usize,
    pub n_mfcc: usize,
    pub n_chroma: usize,
    /// Tuning deviation from A440 in fractions of a chroma bin.
    pub chroma_tuning: f64,
    pub contrast_bands: usize,
    pub contrast_fmin_hz: f64,
    pub contrast_quantile: f64,
    pub rolloff_percent: f64,
    pub top_db: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            window: WindowKind::Hann,
            n_mels: 128,
            n_mfcc: 13,
            n_chroma: 12,
            chroma_tuning: 0.0,
            contrast_bands: 6,
            contrast_fmin_hz: 200.0,
            contrast_quantile: 0.02,
            rolloff_percent: 0.85,
            top_db: 80.0,
        }
    }
}

/// Complete configuration for one [`crate::pipeline::Predictor`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_duration_seconds: f64,
    /// Analysis sample rate; `0` keeps each file's native rate.
    pub sample_rate: u32,
    pub excluded_feature_columns: Vec<String>,
    pub analysis: AnalysisConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_duration_seconds: DEFAULT_TARGET_DURATION_SECONDS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            excluded_feature_columns: DEFAULT_EXCLUDED_COLUMNS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Target sample rate, or `None` when files keep their native rate.
    pub fn resample_target(&self) -> Option<u32> {
        (self.sample_rate > 0).then_some(self.sample_rate)
    }

    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `pipeline.toml` from the application directory, or defaults when absent.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = app_dirs::pipeline_config_path()?;
        if path.is_file() {
            tracing::info!("Loading pipeline config from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check that every value is usable and consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.target_duration_seconds.is_finite() || self.target_duration_seconds <= 0.0 {
            return Err(invalid(
                "target_duration_seconds",
                format!("must be > 0, got {}", self.target_duration_seconds),
            ));
        }
        let analysis = &self.analysis;
        if analysis.n_fft < 2 {
            return Err(invalid("analysis.n_fft", "must be >= 2".to_string()));
        }
        if analysis.hop_length == 0 {
            return Err(invalid("analysis.hop_length", "must be >= 1".to_string()));
        }
        if analysis.n_mels == 0 {
            return Err(invalid("analysis.n_mels", "must be >= 1".to_string()));
        }
        if analysis.n_mfcc == 0 || analysis.n_mfcc > analysis.n_mels {
            return Err(invalid(
                "analysis.n_mfcc",
                format!("must be in 1..={}, got {}", analysis.n_mels, analysis.n_mfcc),
            ));
        }
        if analysis.n_chroma == 0 {
            return Err(invalid("analysis.n_chroma", "must be >= 1".to_string()));
        }
        if !analysis.chroma_tuning.is_finite() {
            return Err(invalid("analysis.chroma_tuning", "must be finite".to_string()));
        }
        if analysis.contrast_bands == 0 {
            return Err(invalid("analysis.contrast_bands", "must be >= 1".to_string()));
        }
        if !(analysis.contrast_fmin_hz.is_finite() && analysis.contrast_fmin_hz > 0.0) {
            return Err(invalid("analysis.contrast_fmin_hz", "must be > 0".to_string()));
        }
        if !(analysis.contrast_quantile > 0.0 && analysis.contrast_quantile <= 0.5) {
            return Err(invalid(
                "analysis.contrast_quantile",
                format!("must be in (0, 0.5], got {}", analysis.contrast_quantile),
            ));
        }
        if !(analysis.rolloff_percent > 0.0 && analysis.rolloff_percent < 1.0) {
            return Err(invalid(
                "analysis.rolloff_percent",
                format!("must be in (0, 1), got {}", analysis.rolloff_percent),
            ));
        }
        if !(analysis.top_db.is_finite() && analysis.top_db >= 0.0) {
            return Err(invalid("analysis.top_db", "must be >= 0".to_string()));
        }
        for name in &self.excluded_feature_columns {
            if FeatureColumn::parse(name).is_none() {
                return Err(ConfigError::UnknownExcludedColumn(name.clone()));
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}
