//! Column schema of the summarized feature vector.
//!
//! Columns are enumerated from [`FeatureKind::ALL`] × [`FeatureStat::ALL`] instead of being
//! inferred from whatever keys a run happened to produce, so training and inference agree on
//! names and order by construction.

use std::fmt;

/// Named analyses in computation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    ChromaStft,
    Mfcc,
    MelSpectrogram,
    SpectralContrast,
    SpectralCentroid,
    SpectralBandwidth,
    SpectralRolloff,
    ZeroCrossingRate,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 8] = [
        FeatureKind::ChromaStft,
        FeatureKind::Mfcc,
        FeatureKind::MelSpectrogram,
        FeatureKind::SpectralContrast,
        FeatureKind::SpectralCentroid,
        FeatureKind::SpectralBandwidth,
        FeatureKind::SpectralRolloff,
        FeatureKind::ZeroCrossingRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureKind::ChromaStft => "chroma_stft",
            FeatureKind::Mfcc => "mfcc",
            FeatureKind::MelSpectrogram => "mel_spectrogram",
            FeatureKind::SpectralContrast => "spectral_contrast",
            FeatureKind::SpectralCentroid => "spectral_centroid",
            FeatureKind::SpectralBandwidth => "spectral_bandwidth",
            FeatureKind::SpectralRolloff => "spectral_rolloff",
            FeatureKind::ZeroCrossingRate => "zero_crossing_rate",
        }
    }
}

/// Scalar statistic reduced from one feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureStat {
    Mean,
    Std,
    Max,
    Min,
}

impl FeatureStat {
    pub const ALL: [FeatureStat; 4] = [
        FeatureStat::Mean,
        FeatureStat::Std,
        FeatureStat::Max,
        FeatureStat::Min,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureStat::Mean => "mean",
            FeatureStat::Std => "std",
            FeatureStat::Max => "max",
            FeatureStat::Min => "min",
        }
    }
}

/// One `{feature}_{stat}` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureColumn {
    pub kind: FeatureKind,
    pub stat: FeatureStat,
}

impl FeatureColumn {
    pub fn new(kind: FeatureKind, stat: FeatureStat) -> Self {
        Self { kind, stat }
    }

    /// Column name as stored in model artifacts.
    pub fn name(self) -> String {
        format!("{}_{}", self.kind.name(), self.stat.name())
    }

    /// Parse a column name back into its typed form.
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, stat) = name.rsplit_once('_')?;
        let kind = FeatureKind::ALL.into_iter().find(|k| k.name() == kind)?;
        let stat = FeatureStat::ALL.into_iter().find(|s| s.name() == stat)?;
        Some(Self { kind, stat })
    }
}

impl fmt::Display for FeatureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind.name(), self.stat.name())
    }
}

/// Ordered list of the columns a pipeline emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    /// Every column in canonical order, minus the excluded names.
    ///
    /// Unknown names in `excluded` are ignored here; config validation rejects them earlier.
    pub fn with_exclusions<S: AsRef<str>>(excluded: &[S]) -> Self {
        let columns = FeatureKind::ALL
            .into_iter()
            .flat_map(|kind| {
                FeatureStat::ALL
                    .into_iter()
                    .map(move |stat| FeatureColumn::new(kind, stat))
            })
            .filter(|column| {
                let name = column.name();
                !excluded.iter().any(|ex| ex.as_ref() == name)
            })
            .collect();
        Self { columns }
    }

    pub fn from_config(config: &crate::config::PipelineConfig) -> Self {
        Self::with_exclusions(&config.excluded_feature_columns)
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_schema_has_thirty_two_columns_in_order() {
        let schema = FeatureSchema::with_exclusions::<&str>(&[]);
        assert_eq!(schema.len(), 32);
        let names = schema.names();
        assert_eq!(names[0], "chroma_stft_mean");
        assert_eq!(names[3], "chroma_stft_min");
        assert_eq!(names[4], "mfcc_mean");
        assert_eq!(names[31], "zero_crossing_rate_min");
    }

    #[test]
    fn default_exclusions_drop_two_columns() {
        let schema = FeatureSchema::from_config(&crate::config::PipelineConfig::default());
        let names = schema.names();
        assert_eq!(names.len(), 30);
        assert!(!names.iter().any(|n| n == "mel_spectrogram_min"));
        assert!(!names.iter().any(|n| n == "chroma_stft_max"));
        assert_eq!(&names[..3], &["chroma_stft_mean", "chroma_stft_std", "chroma_stft_min"]);
    }

    #[test]
    fn parse_handles_underscored_feature_names() {
        let column = FeatureColumn::parse("zero_crossing_rate_std").unwrap();
        assert_eq!(column.kind, FeatureKind::ZeroCrossingRate);
        assert_eq!(column.stat, FeatureStat::Std);
        assert_eq!(column.to_string(), "zero_crossing_rate_std");
        assert!(FeatureColumn::parse("mfcc").is_none());
        assert!(FeatureColumn::parse("mfcc_median").is_none());
    }
}
