//! Per-frame spectral shape descriptors on a magnitude spectrogram.
//!
//! Each returns a `(1, frames)` matrix. Frames without energy yield 0.

use ndarray::{Array2, ArrayView1};

pub(crate) fn spectral_centroid(magnitude: &Array2<f32>, frequencies: &[f64]) -> Array2<f32> {
    per_frame(magnitude, |frame| centroid(frame, frequencies))
}

/// Weighted deviation around the centroid with exponent 2.
pub(crate) fn spectral_bandwidth(magnitude: &Array2<f32>, frequencies: &[f64]) -> Array2<f32> {
    per_frame(magnitude, |frame| {
        let total = frame_total(frame);
        if total < f64::MIN_POSITIVE {
            return 0.0;
        }
        let center = centroid(frame, frequencies);
        let spread: f64 = frame
            .iter()
            .zip(frequencies)
            .map(|(m, f)| {
                let deviation = f - center;
                (*m as f64 / total) * deviation * deviation
            })
            .sum();
        spread.sqrt()
    })
}

/// Lowest frequency below which `percent` of the frame's magnitude lies.
pub(crate) fn spectral_rolloff(
    magnitude: &Array2<f32>,
    frequencies: &[f64],
    percent: f64,
) -> Array2<f32> {
    per_frame(magnitude, |frame| {
        let threshold = percent * frame_total(frame);
        let mut cumulative = 0.0_f64;
        for (m, f) in frame.iter().zip(frequencies) {
            cumulative += *m as f64;
            if cumulative >= threshold {
                return *f;
            }
        }
        frequencies.last().copied().unwrap_or(0.0)
    })
}

fn per_frame(magnitude: &Array2<f32>, f: impl Fn(ArrayView1<'_, f32>) -> f64) -> Array2<f32> {
    Array2::from_shape_fn((1, magnitude.ncols()), |(_, frame)| {
        f(magnitude.column(frame)) as f32
    })
}

fn frame_total(frame: ArrayView1<'_, f32>) -> f64 {
    frame.iter().map(|m| m.abs() as f64).sum()
}

fn centroid(frame: ArrayView1<'_, f32>, frequencies: &[f64]) -> f64 {
    let total = frame_total(frame);
    if total < f64::MIN_POSITIVE {
        return 0.0;
    }
    frame
        .iter()
        .zip(frequencies)
        .map(|(m, f)| f * (*m as f64 / total))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies() -> Vec<f64> {
        (0..5).map(|i| i as f64 * 100.0).collect()
    }

    #[test]
    fn single_bin_frame_centres_on_that_bin() {
        let mut magnitude = Array2::<f32>::zeros((5, 1));
        magnitude[[3, 0]] = 2.0;
        let freqs = frequencies();
        assert_eq!(spectral_centroid(&magnitude, &freqs)[[0, 0]], 300.0);
        assert_eq!(spectral_bandwidth(&magnitude, &freqs)[[0, 0]], 0.0);
        assert_eq!(spectral_rolloff(&magnitude, &freqs, 0.85)[[0, 0]], 300.0);
    }

    #[test]
    fn two_equal_bins_spread_symmetrically() {
        let mut magnitude = Array2::<f32>::zeros((5, 1));
        magnitude[[1, 0]] = 1.0;
        magnitude[[3, 0]] = 1.0;
        let freqs = frequencies();
        assert!((spectral_centroid(&magnitude, &freqs)[[0, 0]] - 200.0).abs() < 1e-4);
        assert!((spectral_bandwidth(&magnitude, &freqs)[[0, 0]] - 100.0).abs() < 1e-4);
        assert_eq!(spectral_rolloff(&magnitude, &freqs, 0.85)[[0, 0]], 300.0);
        assert_eq!(spectral_rolloff(&magnitude, &freqs, 0.4)[[0, 0]], 100.0);
    }

    #[test]
    fn silent_frames_yield_zero() {
        let magnitude = Array2::<f32>::zeros((5, 3));
        let freqs = frequencies();
        for matrix in [
            spectral_centroid(&magnitude, &freqs),
            spectral_bandwidth(&magnitude, &freqs),
            spectral_rolloff(&magnitude, &freqs, 0.85),
        ] {
            assert_eq!(matrix.dim(), (1, 3));
            assert!(matrix.iter().all(|v| *v == 0.0));
        }
    }
}
