//! Fixed-length normalization ahead of feature extraction.

use super::audio::Waveform;

/// A waveform whose length is exactly `round(target_seconds * sample_rate)` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWaveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl NormalizedWaveform {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Number of samples a clip of `target_seconds` holds at `sample_rate`.
pub fn target_samples(target_seconds: f64, sample_rate: u32) -> usize {
    (target_seconds * sample_rate as f64).round().max(0.0) as usize
}

/// Zero-pad at the end or truncate the tail so the clip has exactly the target length.
pub fn normalize_duration(waveform: Waveform, target_seconds: f64) -> NormalizedWaveform {
    let sample_rate = waveform.sample_rate();
    let target = target_samples(target_seconds, sample_rate);
    let mut samples = waveform.into_samples();
    let original = samples.len();
    if original < target {
        samples.resize(target, 0.0);
        tracing::debug!("Padded {original} samples to {target}");
    } else if original > target {
        samples.truncate(target);
        tracing::warn!(
            "Truncated {} trailing samples ({:.3}s) beyond target length {target}",
            original - target,
            (original - target) as f64 / sample_rate as f64
        );
    }
    NormalizedWaveform {
        samples,
        sample_rate,
    }
}
