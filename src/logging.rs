//! Tracing setup for the `breathscan` CLI.
//!
//! Human-readable lines go to stderr so stdout carries nothing but JSON. Each launch also
//! appends to its own file under the app log folder; only the newest few launches are kept.
//! `BREATHSCAN_LOG` takes an `EnvFilter` directive and wins over `RUST_LOG`.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

/// Launch logs kept after pruning, the current one included.
const KEEP_LAUNCH_LOGS: usize = 10;
const LOG_FILE_PREFIX: &str = "breathscan_";
const LOG_FILE_SUFFIX: &str = ".log";
/// Filter variable checked before `RUST_LOG`.
pub const LOG_FILTER_ENV: &str = "BREATHSCAN_LOG";
const DEFAULT_FILTER: &str = "breathscan=info,warn";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    Dir(#[from] app_dirs::AppDirError),
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log file time: {0}")]
    FormatTime(time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
}

/// Install the global subscriber once; later calls return `Ok(())` without doing anything.
///
/// The CLI treats an error as "run without a log file", never as fatal.
pub fn init() -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let log_dir = app_dirs::logs_dir()?;
    let file_name = launch_log_name(now_local_or_utc())?;
    let log_path = log_dir.join(&file_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|source| LoggingError::Io {
            action: "create log file",
            path: log_path.clone(),
            source,
        })?;
    let pruned = prune_launch_logs(&log_dir, KEEP_LAUNCH_LOGS)?;

    let (file_writer, guard) = tracing_appender::non_blocking(rolling::never(&log_dir, file_name));
    let timer = build_timer();
    let console_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(timer.clone())
        .with_writer(std::io::stderr);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(build_env_filter())
        .with(console_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = LOG_GUARD.set(guard);

    tracing::debug!(
        "Logging to {} ({pruned} old launch logs removed)",
        log_path.display()
    );
    Ok(())
}

/// Delete all but the newest `keep` launch logs and return how many were removed.
///
/// Launch logs are recognised by name and ordered by the timestamp embedded in it, so other
/// files dropped into the folder are never touched.
fn prune_launch_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let mut launches: Vec<(String, PathBuf)> = fs::read_dir(dir)
        .map_err(|source| LoggingError::Io {
            action: "read log directory",
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stamp = name
                .strip_prefix(LOG_FILE_PREFIX)?
                .strip_suffix(LOG_FILE_SUFFIX)?
                .to_string();
            Some((stamp, entry.path()))
        })
        .collect();

    // Timestamps are zero-padded, so string order is chronological.
    launches.sort_by(|a, b| b.0.cmp(&a.0));
    let stale = launches.split_off(keep.min(launches.len()));
    for (_, path) in &stale {
        fs::remove_file(path).map_err(|source| LoggingError::Io {
            action: "remove old log file",
            path: path.clone(),
            source,
        })?;
    }
    Ok(stale.len())
}

fn launch_log_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let stamp = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}{LOG_FILE_SUFFIX}"))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
