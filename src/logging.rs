use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sends logs to `<config_dir>/hn-feed.log`, keeping stdout for feed output.
///
/// `RUST_LOG` wins over the default level. The returned guard flushes the
/// writer when dropped and must live until exit.
pub fn init(config_dir: &Path, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("Failed to create directory {}", config_dir.display()))?;

    let appender = tracing_appender::rolling::never(config_dir, "hn-feed.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,hn_feed={default_level}"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
