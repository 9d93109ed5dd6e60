mod support;

use std::path::PathBuf;
use std::sync::Arc;

use breathscan::{
    ErrorKind, FeatureSchema, InferenceError, ModelHandle, PipelineConfig, Predictor, Waveform,
    normalize_duration,
};
use support::model::{NOISY, TONAL, write_model, zcr_threshold_artifact};
use support::signal::{noise, sine};
use support::wav::{write_interleaved_wav, write_test_wav};
use tempfile::TempDir;

const SR: u32 = 22_050;

fn short_config() -> PipelineConfig {
    PipelineConfig {
        target_duration_seconds: 1.0,
        ..PipelineConfig::default()
    }
}

struct Fixture {
    temp: TempDir,
    model_path: PathBuf,
    tonal: PathBuf,
    noisy: PathBuf,
}

impl Fixture {
    fn new(config: &PipelineConfig) -> Self {
        let temp = tempfile::tempdir().expect("create tempdir");
        let names = FeatureSchema::from_config(config).names();
        let model_path = write_model(temp.path(), &zcr_threshold_artifact(names));
        let tonal = temp.path().join("tonal.wav");
        write_test_wav(&tonal, &sine(440.0, SR, 1.0, 0.5), SR);
        let noisy = temp.path().join("noisy.wav");
        write_test_wav(&noisy, &noise(7, SR as usize, 0.5), SR);
        Self {
            temp,
            model_path,
            tonal,
            noisy,
        }
    }

    fn predictor(&self, config: PipelineConfig) -> Predictor {
        Predictor::new(config, Arc::new(ModelHandle::lazy(&self.model_path))).expect("predictor")
    }
}

#[test]
fn scenario_a_short_clip_is_padded_to_target() {
    let input = sine(200.0, 16_000, 4.0, 0.3);
    let normalized = normalize_duration(
        Waveform::new(input.clone(), 16_000),
        PipelineConfig::default().target_duration_seconds,
    );
    assert_eq!(normalized.len(), 125_696);
    assert_eq!(&normalized.samples()[..input.len()], input.as_slice());
    assert!(normalized.samples()[input.len()..].iter().all(|s| *s == 0.0));
}

#[test]
fn scenario_b_long_clip_is_truncated_to_target() {
    let input = noise(3, 10 * 16_000, 0.5);
    let normalized = normalize_duration(
        Waveform::new(input.clone(), 16_000),
        PipelineConfig::default().target_duration_seconds,
    );
    assert_eq!(normalized.samples(), &input[..125_696]);
}

#[test]
fn predicts_labels_with_normalized_probabilities() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config);

    for (path, expected) in [(&fixture.tonal, TONAL), (&fixture.noisy, NOISY)] {
        let result = predictor.predict_file(path).expect("prediction");
        assert_eq!(result.label, expected);
        let sum: f64 = result.all_probabilities.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        let max = result
            .all_probabilities
            .values()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(result.top_probability, max);
        assert_eq!(result.all_probabilities[&result.label], result.top_probability);
    }
}

#[test]
fn default_config_runs_end_to_end() {
    let config = PipelineConfig::default();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config);
    let vector = predictor.feature_vector(&fixture.noisy).expect("features");
    assert_eq!(vector.len(), 30);
    let result = predictor.predict_file(&fixture.tonal).expect("prediction");
    assert_eq!(result.all_probabilities.len(), 2);
}

#[test]
fn feature_vectors_are_deterministic() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config);
    let first = predictor.feature_vector(&fixture.noisy).expect("first run");
    let second = predictor.feature_vector(&fixture.noisy).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn excluded_columns_never_appear() {
    let mut config = short_config();
    config.excluded_feature_columns.push("spectral_rolloff_std".to_string());
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config.clone());
    let vector = predictor.feature_vector(&fixture.tonal).expect("features");
    assert_eq!(vector.len(), 29);
    for excluded in &config.excluded_feature_columns {
        assert!(vector.get(excluded).is_none(), "{excluded} leaked into the vector");
    }
    assert_eq!(vector.names(), predictor.schema().names());
}

#[test]
fn silent_file_has_zero_crossing_rate_and_no_nan() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let silent = fixture.temp.path().join("silent.wav");
    write_test_wav(&silent, &vec![0.0; SR as usize / 2], SR);
    let predictor = fixture.predictor(config);

    let vector = predictor.feature_vector(&silent).expect("features");
    assert_eq!(vector.get("zero_crossing_rate_mean"), Some(0.0));
    assert_eq!(vector.get("zero_crossing_rate_max"), Some(0.0));
    assert!(vector.values().iter().all(|v| v.is_finite()));
    let result = predictor.predict_file(&silent).expect("prediction");
    assert_eq!(result.label, TONAL);
}

#[test]
fn scenario_c_missing_model_is_not_cached() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let late_model = fixture.temp.path().join("late.json");
    let handle = Arc::new(ModelHandle::lazy(&late_model));
    let predictor = Predictor::new(config.clone(), Arc::clone(&handle)).expect("predictor");

    let err = predictor.predict_file(&fixture.tonal).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Initialization);
    assert!(!handle.is_loaded());
    let err = predictor.predict_file(&fixture.tonal).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Initialization);

    std::fs::copy(&fixture.model_path, &late_model).expect("install model");
    let result = predictor.predict_file(&fixture.tonal).expect("prediction after install");
    assert_eq!(result.label, TONAL);
    assert!(handle.is_loaded());
}

#[test]
fn scenario_d_concurrent_predictions_are_independent() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config);
    let sequential_tonal = predictor.predict_file(&fixture.tonal).expect("tonal");
    let sequential_noisy = predictor.predict_file(&fixture.noisy).expect("noisy");

    let (tonal, noisy) = std::thread::scope(|scope| {
        let a = scope.spawn(|| predictor.predict_file(&fixture.tonal));
        let b = scope.spawn(|| predictor.predict_file(&fixture.noisy));
        (a.join().expect("join"), b.join().expect("join"))
    });
    assert_eq!(tonal.expect("tonal"), sequential_tonal);
    assert_eq!(noisy.expect("noisy"), sequential_noisy);

    let batch = predictor.predict_files(&[
        fixture.noisy.clone(),
        fixture.tonal.clone(),
        fixture.noisy.clone(),
    ]);
    let labels: Vec<String> = batch
        .into_iter()
        .map(|result| result.expect("batch prediction").label)
        .collect();
    assert_eq!(labels, vec![NOISY, TONAL, NOISY]);
}

#[test]
fn model_with_other_schema_is_rejected() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let full = FeatureSchema::with_exclusions::<&str>(&[]).names();
    let model_path = write_model(
        fixture.temp.path(),
        &breathscan::ModelArtifact {
            model_id: "full_schema".to_string(),
            ..zcr_threshold_artifact(full)
        },
    );
    let predictor =
        Predictor::new(config, Arc::new(ModelHandle::lazy(model_path))).expect("predictor");
    match predictor.predict_file(&fixture.tonal) {
        Err(InferenceError::SchemaMismatch(mismatch)) => {
            assert_eq!(mismatch.expected_len, 32);
            assert_eq!(mismatch.actual_len, 30);
            assert_eq!(
                mismatch.missing,
                vec!["chroma_stft_max".to_string(), "mel_spectrogram_min".to_string()]
            );
            assert!(mismatch.unexpected.is_empty());
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}

#[test]
fn model_column_order_is_bound_by_name() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let mut reversed = FeatureSchema::from_config(&config).names();
    reversed.reverse();
    let model_path = write_model(
        fixture.temp.path(),
        &breathscan::ModelArtifact {
            model_id: "reversed".to_string(),
            ..zcr_threshold_artifact(reversed)
        },
    );
    let predictor =
        Predictor::new(config, Arc::new(ModelHandle::lazy(model_path))).expect("predictor");
    assert_eq!(predictor.predict_file(&fixture.noisy).expect("noisy").label, NOISY);
    assert_eq!(predictor.predict_file(&fixture.tonal).expect("tonal").label, TONAL);
}

#[test]
fn bytes_and_file_inputs_agree() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config);
    let bytes = std::fs::read(&fixture.noisy).expect("read wav");
    let from_bytes = predictor
        .predict_bytes(bytes, std::path::Path::new("upload.wav"))
        .expect("bytes prediction");
    let from_file = predictor.predict_file(&fixture.noisy).expect("file prediction");
    assert_eq!(from_bytes, from_file);
}

#[test]
fn stereo_and_other_rates_are_downmixed_and_resampled() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let stereo = fixture.temp.path().join("stereo_44k.wav");
    let left = sine(440.0, 44_100, 1.0, 0.5);
    let interleaved: Vec<f32> = left.iter().flat_map(|s| [*s, *s]).collect();
    write_interleaved_wav(&stereo, &interleaved, 2, 44_100);
    let predictor = fixture.predictor(config);
    assert_eq!(predictor.predict_file(&stereo).expect("stereo").label, TONAL);
}

#[test]
fn unreadable_audio_is_a_decode_error() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config);

    let missing = fixture.temp.path().join("missing.wav");
    assert_eq!(
        predictor.predict_file(&missing).unwrap_err().kind(),
        ErrorKind::Decode
    );

    let garbage = fixture.temp.path().join("garbage.wav");
    std::fs::write(&garbage, b"RIFF but not really").expect("write garbage");
    assert_eq!(
        predictor.feature_vector(&garbage).unwrap_err().kind(),
        ErrorKind::Decode
    );
}

#[test]
fn tone_above_target_nyquist_does_not_alias_into_features() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let high = fixture.temp.path().join("tone_15k_44k.wav");
    let mut samples = sine(15_000.0, 44_100, 1.0, 0.5);
    let fade = 256;
    let len = samples.len();
    for i in 0..fade {
        let gain = i as f32 / fade as f32;
        samples[i] *= gain;
        samples[len - 1 - i] *= gain;
    }
    write_test_wav(&high, &samples, 44_100);
    let predictor = fixture.predictor(config);

    let aliased = predictor.feature_vector(&high).expect("high tone");
    let in_band = predictor.feature_vector(&fixture.tonal).expect("in-band tone");
    let aliased_peak = aliased.get("mel_spectrogram_max").expect("mel max");
    let in_band_peak = in_band.get("mel_spectrogram_max").expect("mel max");
    assert!(aliased_peak < 1.0, "aliased energy {aliased_peak}");
    assert!(in_band_peak > 100.0 * aliased_peak.max(1e-3));
}

#[test]
fn batch_larger_than_worker_cap_keeps_input_order() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = fixture.predictor(config).with_batch_workers(2);
    let paths: Vec<PathBuf> = (0..7)
        .map(|i| {
            if i % 3 == 0 {
                fixture.tonal.clone()
            } else {
                fixture.noisy.clone()
            }
        })
        .chain(std::iter::once(fixture.temp.path().join("missing.wav")))
        .collect();

    let results = predictor.predict_files(&paths);
    assert_eq!(results.len(), paths.len());
    for (i, result) in results.iter().take(7).enumerate() {
        let expected = if i % 3 == 0 { TONAL } else { NOISY };
        assert_eq!(result.as_ref().expect("prediction").label, expected);
    }
    assert_eq!(
        results[7].as_ref().unwrap_err().kind(),
        ErrorKind::Decode
    );
}

#[test]
fn features_only_predictor_exports_vectors() {
    let config = short_config();
    let fixture = Fixture::new(&config);
    let predictor = Predictor::features_only(config).expect("predictor");
    let vector = predictor.feature_vector(&fixture.tonal).expect("features");
    assert_eq!(vector.names(), predictor.schema().names());
    assert_eq!(
        predictor.predict_file(&fixture.tonal).unwrap_err().kind(),
        ErrorKind::Initialization
    );
}

#[test]
fn seeded_noise_fixture_is_reproducible_and_bounded() {
    let first = noise(7, 4_096, 0.5);
    assert_eq!(first, noise(7, 4_096, 0.5));
    assert_ne!(first, noise(8, 4_096, 0.5));
    assert!(first.iter().all(|v| v.abs() <= 0.5));
}
