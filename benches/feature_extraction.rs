use std::hint::black_box;

use breathscan::analysis::schema::FeatureSchema;
use breathscan::{PipelineConfig, Waveform, extract_features, normalize_duration, summarize};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn test_clip(sample_rate: u32, seconds: f32) -> Vec<f32> {
    let len = (sample_rate as f32 * seconds) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.4 * (2.0 * std::f32::consts::PI * 310.0 * t).sin()
                + 0.1 * (2.0 * std::f32::consts::PI * 2_450.0 * t).sin()
        })
        .collect()
}

fn bench_feature_extraction(c: &mut Criterion) {
    let config = PipelineConfig::default();
    let schema = FeatureSchema::from_config(&config);
    let samples = test_clip(config.sample_rate, 6.0);
    let clip = normalize_duration(
        Waveform::new(samples, config.sample_rate),
        config.target_duration_seconds,
    );
    c.bench_with_input(
        BenchmarkId::new("extract_and_summarize", clip.len()),
        &clip,
        |b, clip| {
            b.iter(|| {
                let features =
                    extract_features(black_box(clip), &config.analysis).expect("features");
                summarize(&features, &schema).expect("summary")
            });
        },
    );
}

criterion_group!(benches, bench_feature_extraction);
criterion_main!(benches);
