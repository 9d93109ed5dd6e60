use ndarray::Array2;
use rustfft::{FftPlanner, num_complex::Complex32};

use crate::config::WindowKind;

/// Analysis window of `length` samples.
///
/// Hann is the periodic variant (`0.5 - 0.5 cos(2πn/N)`), matching spectral analysis use.
pub(crate) fn analysis_window(kind: WindowKind, length: usize) -> Vec<f32> {
    match kind {
        WindowKind::Rectangular => vec![1.0_f32; length],
        WindowKind::Hann => {
            let n = length.max(1) as f64;
            (0..length)
                .map(|i| (0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n).cos()) as f32)
                .collect()
        }
    }
}

/// Number of frames a centered STFT produces for `len` samples.
pub(crate) fn centered_frame_count(len: usize, n_fft: usize, hop: usize) -> usize {
    let padded = len + 2 * (n_fft / 2);
    if padded < n_fft {
        1
    } else {
        1 + (padded - n_fft) / hop.max(1)
    }
}

/// Centered short-time magnitude spectrogram, shaped `(n_fft / 2 + 1, frames)`.
///
/// The signal is zero-padded by `n_fft / 2` on both sides so frame `t` is centred on sample
/// `t * hop`.
pub(crate) fn magnitude_spectrogram(
    samples: &[f32],
    n_fft: usize,
    hop: usize,
    window: WindowKind,
) -> Array2<f32> {
    let n_fft = n_fft.max(1);
    let hop = hop.max(1);
    let pad = n_fft / 2;
    let bins = n_fft / 2 + 1;
    let frames = centered_frame_count(samples.len(), n_fft, hop);
    let window = analysis_window(window, n_fft);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut buffer = vec![Complex32::new(0.0, 0.0); n_fft];
    let mut scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];
    let mut magnitude = Array2::<f32>::zeros((bins, frames));

    for frame in 0..frames {
        let start = frame * hop;
        for (i, cell) in buffer.iter_mut().enumerate() {
            let sample = (start + i)
                .checked_sub(pad)
                .and_then(|idx| samples.get(idx))
                .copied()
                .unwrap_or(0.0);
            *cell = Complex32::new(sample * window[i], 0.0);
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);
        for (bin, value) in buffer[..bins].iter().enumerate() {
            magnitude[[bin, frame]] = value.norm();
        }
    }
    magnitude
}
