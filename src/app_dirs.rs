//! Where breathscan keeps its optional config and its logs.
//!
//! Everything sits under one `.breathscan` folder in the OS config directory.
//! `BREATHSCAN_CONFIG_HOME` replaces that base, which is how containers and the
//! integration tests point the CLI at a scratch location.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the config base.
pub const APP_DIR_NAME: &str = ".breathscan";
/// Environment variable replacing the config base.
pub const CONFIG_HOME_ENV: &str = "BREATHSCAN_CONFIG_HOME";
/// Pipeline config read by the CLI when `--config` is absent.
pub const PIPELINE_CONFIG_FILE: &str = "pipeline.toml";
const LOGS_DIR_NAME: &str = "logs";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config base directory: set {CONFIG_HOME_ENV} or a user config directory")]
    NoBaseDir,
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The `.breathscan` folder, created on first use.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Log folder inside the root, created on first use.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

/// Location of the default pipeline config. The file itself may not exist.
pub fn pipeline_config_path() -> Result<PathBuf, AppDirError> {
    Ok(app_root_dir()?.join(PIPELINE_CONFIG_FILE))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    if !path.is_dir() {
        std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
            path: path.clone(),
            source,
        })?;
    }
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    let overridden = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone());
    overridden
        .or_else(|| env_base_dir(std::env::var_os(CONFIG_HOME_ENV).as_deref().map(Path::new)))
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}

/// An empty override counts as unset so `BREATHSCAN_CONFIG_HOME=` falls back to the OS default.
fn env_base_dir(value: Option<&Path>) -> Option<PathBuf> {
    value
        .filter(|path| !path.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
pub(crate) fn set_config_base_override(path: Option<PathBuf>) {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .unwrap_or_else(|err| err.into_inner());
    *guard = path;
}
