use std::fs::{File, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// Output goes to the configured log file, or to stderr so that stdout stays
/// free for tree, DOT and table output. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(build_filter(config));
    let file = config.file_path.as_deref().map(open_log_file).transpose()?;

    match (config.format.as_str(), file) {
        ("json", Some(file)) => registry
            .with(fmt::layer().json().with_writer(Mutex::new(file)))
            .try_init()?,
        ("json", None) => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        (_, Some(file)) => registry
            .with(fmt::layer().with_target(false).with_ansi(false).with_writer(Mutex::new(file)))
            .try_init()?,
        (_, None) => registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?,
    }

    tracing::debug!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}

/// `RUST_LOG` first, then the configured level, then `warn`.
fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn open_log_file(path: &str) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))
}
