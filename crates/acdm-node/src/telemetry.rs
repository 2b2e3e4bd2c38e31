//! Logging initialization.
//!
//! Structured logging through tracing, printed pretty or as JSON lines, or
//! appended to a file through a non-blocking writer.

use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

// Keeps the file writer flushing until the process exits
static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> = Mutex::new(None);

/// Initialize logging to stdout. `log_level` accepts env-filter directives.
pub fn init_telemetry(log_level: &str, json_format: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init()?;
    }

    Ok(())
}

/// Initialize logging appended to `log_file`.
pub fn init_telemetry_with_file(log_level: &str, json_format: bool, log_file: &Path) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(log_level)?;

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init()?;
    }

    if let Ok(mut slot) = LOG_GUARD.lock() {
        *slot = Some(guard);
    }

    Ok(())
}

/// Initialize from the `[logging]` section.
pub fn init_from_config(config: &LoggingConfig) -> anyhow::Result<()> {
    let json = config.format == "json";
    match &config.log_file {
        Some(path) => init_telemetry_with_file(&config.level, json, path),
        None => init_telemetry(&config.level, json),
    }
}
