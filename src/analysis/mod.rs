//! Audio-to-feature pipeline: decode, fix duration, analyse, summarize.

pub mod audio;
pub mod duration;
pub(crate) mod frequency_domain;
pub mod schema;
pub mod summary;
pub(crate) mod time_domain;

use ndarray::Array2;

use crate::config::AnalysisConfig;
use crate::error::InferenceError;
use duration::NormalizedWaveform;
use frequency_domain::{Spectrogram, chroma, contrast, mel, spectral};
use schema::FeatureKind;

/// One named analysis, shaped `(coefficients, frames)`.
///
/// Scalar-per-frame analyses have a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    kind: FeatureKind,
    values: Array2<f32>,
}

impl FeatureMatrix {
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }
}

/// Every analysis for one clip, in [`FeatureKind::ALL`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    matrices: Vec<FeatureMatrix>,
}

impl FeatureSet {
    pub fn get(&self, kind: FeatureKind) -> Option<&FeatureMatrix> {
        self.matrices.iter().find(|matrix| matrix.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureMatrix> {
        self.matrices.iter()
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

/// Compute all eight analyses over a fixed-length clip.
///
/// Spectral analyses share one STFT; the zero-crossing rate frames the raw samples with the
/// same frame and hop sizes.
pub fn extract_features(
    waveform: &NormalizedWaveform,
    config: &AnalysisConfig,
) -> Result<FeatureSet, InferenceError> {
    let sample_rate = waveform.sample_rate();
    let spectrogram = Spectrogram::compute(waveform.samples(), sample_rate, config);
    let power = spectrogram.power();
    let magnitude = spectrogram.magnitude();
    let freqs = spectrogram.frequencies();

    let chroma_bank =
        chroma::chroma_filterbank(sample_rate, config.n_fft, config.n_chroma, config.chroma_tuning);
    let mel_bank = mel::mel_filterbank(
        sample_rate,
        config.n_fft,
        config.n_mels,
        0.0,
        sample_rate as f64 / 2.0,
    );
    let mel_power = mel::mel_spectrogram(&power, &mel_bank);
    let mfcc = mel::mfcc(&mel_power, config.n_mfcc, config.top_db);
    let contrast = contrast::spectral_contrast(
        magnitude,
        freqs,
        spectrogram.sample_rate(),
        config.contrast_fmin_hz,
        config.contrast_bands,
        config.contrast_quantile,
        config.top_db,
    )?;

    let computed = [
        (FeatureKind::ChromaStft, chroma::chroma_stft(&power, &chroma_bank)),
        (FeatureKind::Mfcc, mfcc),
        (FeatureKind::MelSpectrogram, mel_power),
        (FeatureKind::SpectralContrast, contrast),
        (
            FeatureKind::SpectralCentroid,
            spectral::spectral_centroid(magnitude, freqs),
        ),
        (
            FeatureKind::SpectralBandwidth,
            spectral::spectral_bandwidth(magnitude, freqs),
        ),
        (
            FeatureKind::SpectralRolloff,
            spectral::spectral_rolloff(magnitude, freqs, config.rolloff_percent),
        ),
        (
            FeatureKind::ZeroCrossingRate,
            time_domain::zero_crossing_rate(waveform.samples(), config.n_fft, config.hop_length),
        ),
    ];

    let mut matrices = Vec::with_capacity(computed.len());
    for (kind, values) in computed {
        if values.is_empty() {
            return Err(InferenceError::Computation(format!(
                "{} produced an empty {:?} matrix",
                kind.name(),
                values.dim()
            )));
        }
        tracing::debug!("{}: {:?}", kind.name(), values.dim());
        matrices.push(FeatureMatrix { kind, values });
    }
    tracing::debug!(
        "Extracted {} analyses over {} frames",
        matrices.len(),
        spectrogram.frames()
    );
    Ok(FeatureSet { matrices })
}
