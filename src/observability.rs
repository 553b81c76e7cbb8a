// SPDX-License-Identifier: Apache-2.0

//! Logging and observability helpers.

pub mod sensitive;

pub use sensitive::Sensitive;

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogSettings};

const LOG_FILE_PREFIX: &str = "fedlink.log";

/// Installs the global tracing subscriber.
///
/// Returns `false` when a subscriber was already installed (by an earlier call
/// or by the host application); the existing one is left untouched. A log
/// directory that cannot be created or opened falls back to stderr.
pub fn init_tracing(settings: &LogSettings) -> bool {
    let env_filter = EnvFilter::try_new(&settings.filter)
        .unwrap_or_else(|_| EnvFilter::new(LogSettings::DEFAULT_FILTER));

    let writer = match &settings.directory {
        Some(dir) => match file_writer(dir, settings.retention_days) {
            Ok(writer) => writer,
            Err(e) => {
                eprintln!("Cannot log to {}: {}; logging to stderr", dir.display(), e);
                BoxMakeWriter::new(std::io::stderr)
            }
        },
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(false);

    let installed = match settings.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .try_init()
            .is_ok(),
        LogFormat::Text => builder.try_init().is_ok(),
    };

    if installed {
        tracing::info!(filter = %settings.filter, "Tracing initialized");
    }
    installed
}

/// Daily rolling appender in `dir`, created if missing.
fn file_writer(dir: &Path, retention_days: u64) -> Result<BoxMakeWriter, String> {
    fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    if let Err(e) = cleanup_old_logs(dir, retention_days) {
        eprintln!("Failed to clean up old logs: {}", e);
    }
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(|e| e.to_string())?;
    Ok(BoxMakeWriter::new(appender))
}

fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<()> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let is_ours = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX))
            .unwrap_or(false);
        if !is_ours {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if matches!(age, Some(age) if age > retention) {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("Failed to remove old log file {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}
