use rubato::{FftFixedIn, Resampler};

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Band-limited resampling of mono audio to `output_rate`.
///
/// Content above the lower of the two Nyquist frequencies is filtered out before rate
/// conversion. The filter delay is trimmed, so output length is
/// `round(len * output_rate / input_rate)`; equal rates copy through.
pub(crate) fn resample(
    samples: &[f32],
    input_rate: u32,
    output_rate: u32,
) -> Result<Vec<f32>, String> {
    let input_rate = input_rate.max(1);
    let output_rate = output_rate.max(1);
    if samples.is_empty() || input_rate == output_rate {
        return Ok(samples.to_vec());
    }
    let out_len = ((samples.len() as f64 * output_rate as f64 / input_rate as f64).round()
        as usize)
        .max(1);
    let mut resampler = FftFixedIn::<f32>::new(
        input_rate as usize,
        output_rate as usize,
        CHUNK,
        SUB_CHUNKS,
        1,
    )
    .map_err(|err| format!("Failed to create resampler: {err}"))?;
    let delay = resampler.output_delay();
    let wanted = delay + out_len;
    let mut out = Vec::with_capacity(wanted + CHUNK);

    let mut pos = 0;
    while pos < samples.len() {
        let needed = resampler.input_frames_next();
        let end = (pos + needed).min(samples.len());
        let block = [&samples[pos..end]];
        let frames = if end - pos == needed {
            resampler.process(&block[..], None)
        } else {
            resampler.process_partial(Some(&block[..]), None)
        }
        .map_err(|err| format!("Resampling failed: {err}"))?;
        out.extend(frames.into_iter().flatten());
        pos = end;
    }
    // Flush the delay line with silence until the trimmed length is covered.
    while out.len() < wanted {
        let frames = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|err| format!("Resampling failed: {err}"))?;
        let before = out.len();
        out.extend(frames.into_iter().flatten());
        if out.len() == before {
            break;
        }
    }

    let mut out = out.split_off(delay.min(out.len()));
    out.resize(out_len, 0.0);
    Ok(out)
}
