use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber.
///
/// The terminal belongs to the UI, so logs only go to `log_path`. Without a
/// path the filter is still installed but nothing is written.
pub fn init_tracing(log_path: Option<&Path>) -> Result<(), String>
{
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| format!("Invalid log filter: {err}"))?;

    let Some(path) = log_path else {
        tracing_subscriber::registry().with(env_filter).init();
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("Failed to open log file {}: {err}", path.display()))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(env_filter)
        .init();
    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}
