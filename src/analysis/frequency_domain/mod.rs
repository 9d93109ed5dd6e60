//! Frequency-domain analyses built on one shared centered STFT.

pub(crate) mod chroma;
pub(crate) mod contrast;
pub(crate) mod mel;
pub(crate) mod spectral;
pub(crate) mod stft;

use ndarray::Array2;

use crate::config::AnalysisConfig;

/// Floor applied before taking logarithms.
const AMIN: f32 = 1e-10;

/// Magnitude STFT plus the parameters needed to interpret its rows.
pub(crate) struct Spectrogram {
    magnitude: Array2<f32>,
    frequencies: Vec<f64>,
    sample_rate: u32,
}

impl Spectrogram {
    pub(crate) fn compute(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Self {
        let magnitude =
            stft::magnitude_spectrogram(samples, config.n_fft, config.hop_length, config.window);
        Self {
            magnitude,
            frequencies: fft_frequencies(sample_rate, config.n_fft),
            sample_rate,
        }
    }

    /// `(bins, frames)` magnitudes.
    pub(crate) fn magnitude(&self) -> &Array2<f32> {
        &self.magnitude
    }

    pub(crate) fn power(&self) -> Array2<f32> {
        self.magnitude.mapv(|m| m * m)
    }

    /// Centre frequency in Hz of each row.
    pub(crate) fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub(crate) fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub(crate) fn frames(&self) -> usize {
        self.magnitude.ncols()
    }
}

/// Bin centre frequencies `0, sr/n_fft, …, sr/2`.
pub(crate) fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    let n_fft = n_fft.max(1);
    (0..=n_fft / 2)
        .map(|bin| bin as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

/// `10·log10(max(AMIN, x))` relative to 1.0, clipped to `top_db` below the array's peak.
pub(crate) fn power_to_db(values: &Array2<f32>, top_db: f64) -> Array2<f32> {
    let mut db = values.mapv(|v| 10.0 * v.max(AMIN).log10());
    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if peak.is_finite() {
        let floor = peak - top_db as f32;
        db.mapv_inplace(|v| v.max(floor));
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fft_frequencies_span_dc_to_nyquist() {
        let freqs = fft_frequencies(22_050, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1024] - 11_025.0).abs() < 1e-9);
    }

    #[test]
    fn power_to_db_floors_and_clips() {
        let values = Array2::from_shape_vec((1, 4), vec![1.0_f32, 1e-3, 0.0, 1e-12]).unwrap();
        let db = power_to_db(&values, 80.0);
        assert!((db[[0, 0]] - 0.0).abs() < 1e-6);
        assert!((db[[0, 1]] + 30.0).abs() < 1e-4);
        assert!((db[[0, 2]] + 80.0).abs() < 1e-4);
        assert!((db[[0, 3]] + 80.0).abs() < 1e-4);
    }

    #[test]
    fn spectrogram_shape_matches_config() {
        let config = AnalysisConfig::default();
        let spec = Spectrogram::compute(&vec![0.1; 22_050], 22_050, &config);
        assert_eq!(spec.magnitude().nrows(), 1025);
        assert_eq!(spec.frames(), 1 + 22_050 / 512);
        assert_eq!(spec.frequencies().len(), 1025);
        assert_eq!(spec.power().dim(), spec.magnitude().dim());
    }
}
