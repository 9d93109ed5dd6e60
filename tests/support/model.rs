use std::path::{Path, PathBuf};

use breathscan::ml::artifact::{ModelArtifact, ModelBody};
use breathscan::ml::logreg::LogisticRegression;

pub const TONAL: &str = "tonal";
pub const NOISY: &str = "noisy";

/// Binary logistic model that calls a clip noisy when its mean zero-crossing rate exceeds 0.2.
pub fn zcr_threshold_artifact(feature_names: Vec<String>) -> ModelArtifact {
    let n = feature_names.len();
    let mut feature_mean = vec![0.0_f32; n];
    let feature_scale = vec![1.0_f32; n];
    let mut weights = vec![0.0_f32; n];
    let zcr = feature_names
        .iter()
        .position(|name| name == "zero_crossing_rate_mean")
        .expect("schema has zero_crossing_rate_mean");
    feature_mean[zcr] = 0.2;
    weights[zcr] = 50.0;
    ModelArtifact {
        model_id: "zcr_threshold".to_string(),
        model_version: 1,
        feature_names,
        classes: vec![TONAL.to_string(), NOISY.to_string()],
        model: ModelBody::LogisticRegression(LogisticRegression {
            feature_mean,
            feature_scale,
            weights,
            bias: vec![0.0],
        }),
    }
}

pub fn write_model(dir: &Path, artifact: &ModelArtifact) -> PathBuf {
    let path = dir.join(format!("{}.json", artifact.model_id));
    artifact.save_json(&path).expect("write model artifact");
    path
}
