use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use super::artifact::ModelArtifact;
use crate::error::InferenceError;

/// Process-wide, load-once handle to a model artifact.
///
/// Concurrent first callers serialize on an init gate so the artifact is read at most once per
/// successful load. A failed load caches nothing; the next call retries and reports again.
#[derive(Debug)]
pub struct ModelHandle {
    path: PathBuf,
    model: OnceLock<Arc<ModelArtifact>>,
    init: Mutex<()>,
}

impl ModelHandle {
    /// Create a handle that loads on first use.
    pub fn lazy(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            model: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// Create a handle and load the artifact immediately.
    pub fn eager(path: impl Into<PathBuf>) -> Result<Self, InferenceError> {
        let handle = Self::lazy(path);
        handle.get()?;
        Ok(handle)
    }

    /// Wrap an artifact that is already in memory.
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        let handle = Self::lazy(PathBuf::new());
        let _ = handle.model.set(Arc::new(artifact));
        handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Return the loaded model, loading it first if needed.
    pub fn get(&self) -> Result<Arc<ModelArtifact>, InferenceError> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let _guard = self.init.lock().unwrap_or_else(|err| err.into_inner());
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let artifact = match ModelArtifact::load_json(&self.path) {
            Ok(artifact) => artifact,
            Err(err) => {
                tracing::error!("{err}");
                return Err(err);
            }
        };
        tracing::info!(
            "Loaded model {} v{} ({}, {} classes, {} features) from {}",
            artifact.model_id,
            artifact.model_version,
            artifact.model.kind(),
            artifact.classes.len(),
            artifact.feature_names.len(),
            self.path.display()
        );
        let model = Arc::new(artifact);
        let _ = self.model.set(Arc::clone(&model));
        Ok(model)
    }
}
