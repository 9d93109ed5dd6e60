//! Pitch-class energy from a power spectrogram.

use ndarray::Array2;

const OCTAVE_CENTER: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Chroma filterbank shaped `(n_chroma, n_fft / 2 + 1)`, rows starting at C.
///
/// Each FFT bin contributes a Gaussian bump around its fractional pitch class; columns are
/// L2-normalized, then weighted by a Gaussian over octaves centred on octave 5.
pub(crate) fn chroma_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_chroma: usize,
    tuning: f64,
) -> Array2<f32> {
    let n_chroma_f = n_chroma as f64;
    let a440 = 440.0 * 2.0_f64.powf(tuning / n_chroma_f);
    let mut frqbins: Vec<f64> = Vec::with_capacity(n_fft);
    frqbins.push(0.0);
    frqbins.extend((1..n_fft).map(|i| {
        let freq = i as f64 * sample_rate as f64 / n_fft as f64;
        n_chroma_f * (freq / (a440 / 16.0)).log2()
    }));
    // DC has no pitch; place it one and a half octaves below the first bin.
    frqbins[0] = frqbins.get(1).copied().unwrap_or(0.0) - 1.5 * n_chroma_f;

    let mut binwidths: Vec<f64> = frqbins.windows(2).map(|w| (w[1] - w[0]).max(1.0)).collect();
    binwidths.push(1.0);

    let half = (n_chroma_f / 2.0).round_ties_even();
    let mut weights = Array2::<f64>::zeros((n_chroma, n_fft));
    for (bin, (&frq, &width)) in frqbins.iter().zip(&binwidths).enumerate() {
        for chroma in 0..n_chroma {
            let distance =
                (frq - chroma as f64 + half + 10.0 * n_chroma_f).rem_euclid(n_chroma_f) - half;
            weights[[chroma, bin]] = (-0.5 * (2.0 * distance / width).powi(2)).exp();
        }
    }

    for (bin, mut column) in weights.columns_mut().into_iter().enumerate() {
        let norm = column.iter().map(|w| w * w).sum::<f64>().sqrt();
        let norm = if norm < f64::MIN_POSITIVE { 1.0 } else { norm };
        let octave = (frqbins[bin] / n_chroma_f - OCTAVE_CENTER) / OCTAVE_WIDTH;
        let octave_weight = (-0.5 * octave * octave).exp();
        column.mapv_inplace(|w| w / norm * octave_weight);
    }

    let shift = 3 * (n_chroma / 12);
    let bins = n_fft / 2 + 1;
    Array2::from_shape_fn((n_chroma, bins), |(chroma, bin)| {
        weights[[(chroma + shift) % n_chroma, bin]] as f32
    })
}

/// Project power onto the chroma filterbank and scale each frame to a peak of 1.
///
/// Frames with no energy stay at zero.
pub(crate) fn chroma_stft(power: &Array2<f32>, filterbank: &Array2<f32>) -> Array2<f32> {
    let mut chroma = filterbank.dot(power);
    for mut frame in chroma.columns_mut() {
        let peak = frame.iter().fold(0.0_f32, |acc, v| acc.max(v.abs()));
        if peak >= f32::MIN_POSITIVE {
            frame.mapv_inplace(|v| v / peak);
        }
    }
    chroma
}
