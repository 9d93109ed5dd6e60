//! Waveform loading: decode, downmix to mono, resample.

mod decode;
mod resample;

use std::path::Path;

use crate::error::InferenceError;

/// Mono audio samples in `[-1, 1]` plus their sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    /// Wrap already-mono samples, sanitizing non-finite and out-of-range values.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let samples = samples.into_iter().map(sanitize_sample).collect();
        Self {
            samples,
            sample_rate: sample_rate.max(1),
        }
    }

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

    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub(crate) fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Decode an audio file into a mono waveform.
///
/// With `target_rate` set the audio is resampled; otherwise the native rate is kept.
pub fn load_waveform(path: &Path, target_rate: Option<u32>) -> Result<Waveform, InferenceError> {
    if !path.is_file() {
        return Err(InferenceError::decode(path, "File does not exist"));
    }
    let decoded =
        decode::decode_file(path).map_err(|reason| InferenceError::decode(path, reason))?;
    finish(decoded, target_rate, path)
}

/// Decode an in-memory upload into a mono waveform.
///
/// `label` names the upload in errors and logs; its extension, if any, is a probing hint.
pub fn load_waveform_from_bytes(
    bytes: Vec<u8>,
    label: &Path,
    target_rate: Option<u32>,
) -> Result<Waveform, InferenceError> {
    let hint = label.extension().and_then(|ext| ext.to_str());
    let decoded =
        decode::decode_bytes(bytes, hint).map_err(|reason| InferenceError::decode(label, reason))?;
    finish(decoded, target_rate, label)
}

fn finish(
    decoded: decode::DecodedAudio,
    target_rate: Option<u32>,
    label: &Path,
) -> Result<Waveform, InferenceError> {
    let mono = downmix_to_mono(&decoded.samples, decoded.channels);
    let sample_rate = target_rate.unwrap_or(decoded.sample_rate);
    let mono = resample::resample(&mono, decoded.sample_rate, sample_rate)
        .map_err(|reason| InferenceError::decode(label, reason))?
        .into_iter()
        .map(sanitize_sample)
        .collect::<Vec<_>>();
    tracing::debug!(
        "Decoded {}: {} ch @ {} Hz -> {} mono samples @ {} Hz",
        label.display(),
        decoded.channels,
        decoded.sample_rate,
        mono.len(),
        sample_rate
    );
    Ok(Waveform {
        samples: mono,
        sample_rate,
    })
}

pub(crate) fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.iter().copied().map(sanitize_sample).collect();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().copied().map(sanitize_sample).sum();
            sum / channels as f32
        })
        .collect()
}

fn sanitize_sample(sample: f32) -> f32 {
    if !sample.is_finite() {
        return 0.0;
    }
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped != 0.0 && clamped.abs() < f32::MIN_POSITIVE {
        0.0
    } else {
        clamped
    }
}
