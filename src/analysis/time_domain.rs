//! Time-domain analyses.

use ndarray::Array2;

/// Samples at or below this magnitude count as zero.
const ZERO_THRESHOLD: f32 = 1e-10;

/// Fraction of sign changes per frame, shaped `(1, frames)`.
///
/// Frames are centred like the STFT, but the signal is padded by repeating its edge samples.
/// Zero counts as positive, and the first sample of a frame is never a crossing.
pub(crate) fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop: usize) -> Array2<f32> {
    let frame_length = frame_length.max(1);
    let hop = hop.max(1);
    let pad = frame_length / 2;
    let padded_len = samples.len() + 2 * pad;
    let frames = if padded_len < frame_length {
        1
    } else {
        1 + (padded_len - frame_length) / hop
    };
    let (first, last) = (
        samples.first().copied().unwrap_or(0.0),
        samples.last().copied().unwrap_or(0.0),
    );
    let padded_sign = |idx: usize| -> bool {
        let sample = if idx < pad {
            first
        } else {
            samples.get(idx - pad).copied().unwrap_or(last)
        };
        is_negative(sample)
    };

    Array2::from_shape_fn((1, frames), |(_, frame)| {
        let start = frame * hop;
        let mut previous = padded_sign(start);
        let mut crossings = 0usize;
        for idx in start + 1..start + frame_length {
            let current = padded_sign(idx);
            if current != previous {
                crossings += 1;
            }
            previous = current;
        }
        crossings as f32 / frame_length as f32
    })
}

fn is_negative(sample: f32) -> bool {
    sample.abs() > ZERO_THRESHOLD && sample.is_sign_negative()
}
