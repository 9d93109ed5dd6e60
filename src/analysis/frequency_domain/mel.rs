//! Slaney mel filterbank and cepstral coefficients.

use ndarray::Array2;

use super::{fft_frequencies, power_to_db};

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1_000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Hz to mel on the Slaney scale (linear below 1 kHz, logarithmic above).
pub(crate) fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

pub(crate) fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// Triangular mel filters with Slaney area normalization, shaped `(n_mels, n_fft / 2 + 1)`.
pub(crate) fn mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f64,
    fmax: f64,
) -> Array2<f32> {
    let fft_freqs = fft_frequencies(sample_rate, n_fft);
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let points = n_mels + 2;
    let mel_f: Vec<f64> = (0..points)
        .map(|i| {
            let t = i as f64 / (points - 1) as f64;
            mel_to_hz(mel_min + (mel_max - mel_min) * t)
        })
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, fft_freqs.len()));
    for band in 0..n_mels {
        let lower_width = mel_f[band + 1] - mel_f[band];
        let upper_width = mel_f[band + 2] - mel_f[band + 1];
        let enorm = 2.0 / (mel_f[band + 2] - mel_f[band]);
        for (bin, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - mel_f[band]) / lower_width;
            let upper = (mel_f[band + 2] - freq) / upper_width;
            let weight = lower.min(upper).max(0.0);
            weights[[band, bin]] = (weight * enorm) as f32;
        }
    }
    weights
}

/// Project a power spectrogram onto the mel filterbank.
pub(crate) fn mel_spectrogram(power: &Array2<f32>, filterbank: &Array2<f32>) -> Array2<f32> {
    filterbank.dot(power)
}

/// First `n_mfcc` orthonormal DCT-II coefficients of the dB-scaled mel spectrogram.
pub(crate) fn mfcc(mel_power: &Array2<f32>, n_mfcc: usize, top_db: f64) -> Array2<f32> {
    let log_mel = power_to_db(mel_power, top_db);
    dct_basis(n_mfcc, mel_power.nrows()).dot(&log_mel)
}

fn dct_basis(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in.max(1) as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n);
        (scale * angle.cos()) as f32
    })
}
