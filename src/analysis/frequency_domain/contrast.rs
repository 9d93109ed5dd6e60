use ndarray::Array2;

use super::power_to_db;
use crate::error::InferenceError;

/// Octave-band spectral contrast, shaped `(n_bands + 1, frames)`.
///
/// Band edges are `0, fmin, 2·fmin, …, 2^n_bands·fmin`; the last band runs to Nyquist. Each
/// entry is the dB difference between the mean of the loudest and quietest `quantile` share
/// of magnitudes in the band.
pub(crate) fn spectral_contrast(
    magnitude: &Array2<f32>,
    frequencies: &[f64],
    sample_rate: u32,
    fmin: f64,
    n_bands: usize,
    quantile: f64,
    top_db: f64,
) -> Result<Array2<f32>, InferenceError> {
    let nyquist = sample_rate as f64 / 2.0;
    let mut edges = Vec::with_capacity(n_bands + 2);
    edges.push(0.0);
    edges.extend((0..=n_bands).map(|k| fmin * 2.0_f64.powi(k as i32)));
    if edges[..edges.len() - 1].iter().any(|edge| *edge >= nyquist) {
        return Err(InferenceError::Computation(format!(
            "spectral contrast band edges exceed Nyquist ({nyquist} Hz) for fmin {fmin} Hz and {n_bands} bands"
        )));
    }

    let frames = magnitude.ncols();
    let mut peak = Array2::<f32>::zeros((n_bands + 1, frames));
    let mut valley = Array2::<f32>::zeros((n_bands + 1, frames));
    let mut sorted = Vec::new();

    for band in 0..=n_bands {
        let (f_low, f_high) = (edges[band], edges[band + 1]);
        let in_band: Vec<usize> = frequencies
            .iter()
            .enumerate()
            .filter(|(_, f)| **f >= f_low && **f <= f_high)
            .map(|(idx, _)| idx)
            .collect();
        let (Some(&first), Some(&last)) = (in_band.first(), in_band.last()) else {
            return Err(InferenceError::Computation(format!(
                "spectral contrast band {f_low}-{f_high} Hz contains no FFT bins"
            )));
        };
        let start = if band > 0 { first.saturating_sub(1) } else { first };
        let end = if band == n_bands {
            frequencies.len()
        } else {
            last + 1
        };
        let counted = end - start;
        let used_end = if band < n_bands { end - 1 } else { end };
        let take = ((quantile * counted as f64).round_ties_even() as usize).max(1);

        for frame in 0..frames {
            sorted.clear();
            sorted.extend((start..used_end).map(|bin| magnitude[[bin, frame]]));
            if sorted.is_empty() {
                continue;
            }
            sorted.sort_by(|a, b| a.total_cmp(b));
            let take = take.min(sorted.len());
            valley[[band, frame]] = mean(&sorted[..take]);
            peak[[band, frame]] = mean(&sorted[sorted.len() - take..]);
        }
    }

    Ok(power_to_db(&peak, top_db) - power_to_db(&valley, top_db))
}

fn mean(values: &[f32]) -> f32 {
    (values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::frequency_domain::fft_frequencies;

    #[test]
    fn flat_spectrum_has_zero_contrast() {
        let freqs = fft_frequencies(22_050, 2048);
        let magnitude = Array2::<f32>::from_elem((freqs.len(), 5), 0.5);
        let contrast =
            spectral_contrast(&magnitude, &freqs, 22_050, 200.0, 6, 0.02, 80.0).unwrap();
        assert_eq!(contrast.dim(), (7, 5));
        assert!(contrast.iter().all(|v| v.abs() < 1e-5));
    }

    #[test]
    fn peaked_band_has_positive_contrast() {
        let freqs = fft_frequencies(22_050, 2048);
        let mut magnitude = Array2::<f32>::from_elem((freqs.len(), 1), 1e-3);
        // ~1 kHz sits in the 800-1600 Hz band.
        magnitude[[93, 0]] = 1.0;
        let contrast =
            spectral_contrast(&magnitude, &freqs, 22_050, 200.0, 6, 0.02, 80.0).unwrap();
        // Top two bins average ~0.5 against a 1e-3 floor: about 27 dB.
        assert!(contrast[[3, 0]] > 20.0);
        assert!(contrast[[0, 0]].abs() < 1e-5);
    }

    #[test]
    fn silence_is_finite() {
        let freqs = fft_frequencies(16_000, 2048);
        let magnitude = Array2::<f32>::zeros((freqs.len(), 3));
        let contrast =
            spectral_contrast(&magnitude, &freqs, 16_000, 200.0, 6, 0.02, 80.0).unwrap();
        assert!(contrast.iter().all(|v| v.is_finite() && *v == 0.0));
    }

    #[test]
    fn band_edges_above_nyquist_are_rejected() {
        let freqs = fft_frequencies(8_000, 512);
        let magnitude = Array2::<f32>::zeros((freqs.len(), 1));
        let err = spectral_contrast(&magnitude, &freqs, 8_000, 200.0, 6, 0.02, 80.0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Computation);
    }
}
