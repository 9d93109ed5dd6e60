//! End-to-end inference: audio path in, prediction out.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use crate::analysis::audio::{self, Waveform};
use crate::analysis::duration::normalize_duration;
use crate::analysis::extract_features;
use crate::analysis::schema::FeatureSchema;
use crate::analysis::summary::{FeatureVector, summarize};
use crate::config::{ConfigError, PipelineConfig};
use crate::error::InferenceError;
use crate::ml::{ClassifierAdapter, ModelHandle, PredictionResult};

const MAX_BATCH_WORKERS: usize = 64;

/// Stateless predictor sharing one model handle.
///
/// Every call builds its own intermediate state, so a `Predictor` can serve many threads.
#[derive(Debug, Clone)]
pub struct Predictor {
    config: PipelineConfig,
    schema: FeatureSchema,
    model: Option<Arc<ModelHandle>>,
    batch_workers: usize,
}

impl Predictor {
    pub fn new(config: PipelineConfig, model: Arc<ModelHandle>) -> Result<Self, ConfigError> {
        Self::build(config, Some(model))
    }

    /// Predictor for feature export only; every `predict_*` call fails with
    /// [`InferenceError::Initialization`].
    pub fn features_only(config: PipelineConfig) -> Result<Self, ConfigError> {
        Self::build(config, None)
    }

    fn build(config: PipelineConfig, model: Option<Arc<ModelHandle>>) -> Result<Self, ConfigError> {
        config.validate()?;
        let schema = FeatureSchema::from_config(&config);
        Ok(Self {
            config,
            schema,
            model,
            batch_workers: default_batch_workers(),
        })
    }

    /// Cap the number of threads [`Predictor::predict_files`] runs at once.
    pub fn with_batch_workers(mut self, workers: usize) -> Self {
        self.batch_workers = workers.max(1);
        self
    }

    pub fn batch_workers(&self) -> usize {
        self.batch_workers
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Columns this predictor emits, in order.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> Option<&Arc<ModelHandle>> {
        self.model.as_ref()
    }

    /// Run all five stages on an audio file.
    pub fn predict_file(&self, path: &Path) -> Result<PredictionResult, InferenceError> {
        let waveform = audio::load_waveform(path, self.config.resample_target())?;
        self.predict_waveform(waveform, path)
    }

    /// Run all five stages on an in-memory upload; `label` names it in logs and errors.
    pub fn predict_bytes(
        &self,
        bytes: Vec<u8>,
        label: &Path,
    ) -> Result<PredictionResult, InferenceError> {
        let waveform =
            audio::load_waveform_from_bytes(bytes, label, self.config.resample_target())?;
        self.predict_waveform(waveform, label)
    }

    /// Decode, normalize, analyse, and summarize without classifying.
    pub fn feature_vector(&self, path: &Path) -> Result<FeatureVector, InferenceError> {
        let waveform = audio::load_waveform(path, self.config.resample_target())?;
        self.summarize_waveform(waveform)
    }

    /// Predict many files on at most [`Predictor::batch_workers`] threads; results keep
    /// input order.
    pub fn predict_files(
        &self,
        paths: &[PathBuf],
    ) -> Vec<Result<PredictionResult, InferenceError>> {
        run_bounded(paths.len(), self.batch_workers, |index| {
            self.predict_file(&paths[index])
        })
        .into_iter()
        .zip(paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                Err(InferenceError::Computation(format!(
                    "worker for {} panicked",
                    path.display()
                )))
            })
        })
        .collect()
    }

    fn summarize_waveform(&self, waveform: Waveform) -> Result<FeatureVector, InferenceError> {
        let normalized = normalize_duration(waveform, self.config.target_duration_seconds);
        let features = extract_features(&normalized, &self.config.analysis)?;
        summarize(&features, &self.schema)
    }

    fn predict_waveform(
        &self,
        waveform: Waveform,
        label: &Path,
    ) -> Result<PredictionResult, InferenceError> {
        let model = match &self.model {
            Some(handle) => handle.get()?,
            None => {
                return Err(InferenceError::initialization(
                    label,
                    "predictor was built without a model",
                ));
            }
        };
        let vector = self.summarize_waveform(waveform)?;
        let result = ClassifierAdapter::new(model.as_ref()).classify(&vector)?;
        tracing::info!(
            "{} -> {} ({:.3})",
            label.display(),
            result.label,
            result.top_probability
        );
        Ok(result)
    }
}

fn default_batch_workers() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_BATCH_WORKERS)
}

/// Run `job` for every index in `0..len` on at most `workers` threads.
///
/// Workers pull indices from a shared counter and send results back tagged with their index.
/// A slot stays `None` only if the job for it panicked. Falls back to the calling thread when
/// no worker thread can be started.
fn run_bounded<T, F>(len: usize, workers: usize, job: F) -> Vec<Option<T>>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let mut slots: Vec<Option<T>> = (0..len).map(|_| None).collect();
    if len == 0 {
        return slots;
    }
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel::<(usize, T)>();
    thread::scope(|scope| {
        let mut handles = Vec::new();
        for worker in 0..workers.clamp(1, len) {
            let tx = tx.clone();
            let (next, job) = (&next, &job);
            let spawned = thread::Builder::new()
                .name(format!("breathscan-batch-{worker}"))
                .spawn_scoped(scope, move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        if index >= len {
                            break;
                        }
                        if tx.send((index, job(index))).is_err() {
                            break;
                        }
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    tracing::warn!("Could not start batch worker {worker}: {err}");
                    break;
                }
            }
        }
        drop(tx);
        if handles.is_empty() {
            loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                if index >= len {
                    break;
                }
                slots[index] = Some(job(index));
            }
            return;
        }
        for (index, value) in rx.iter() {
            slots[index] = Some(value);
        }
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Batch worker panicked");
            }
        }
    });
    slots
}
