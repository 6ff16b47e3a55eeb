use std::path::{Path, PathBuf};
use std::sync::Mutex;

use grader_core::settings::Settings;
use grader_runtime::processor::Processor;
use grader_runtime::source::DirectorySource;
use grader_runtime::store::JsonFileStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a CLI level name to a [`tracing_subscriber::EnvFilter`] directive.
///
/// Unknown names are passed through unchanged so raw directives such as
/// `grader_runtime=trace` also work.
pub fn level_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr; when `log_file` is given it is additionally
/// appended to that file without ANSI colours.
pub fn setup_logging(log_level: &str, log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}

// ── Processor bootstrap ────────────────────────────────────────────────────────

/// Build the directory-backed processor described by `settings`.
pub fn build_processor(
    settings: &Settings,
) -> anyhow::Result<Processor<DirectorySource, JsonFileStore>> {
    let logs_dir = settings.require_logs_dir()?;
    let store_path = settings.store_path();
    ensure_parent(&store_path)?;

    tracing::info!(
        "Logs directory: {}, store: {}",
        logs_dir.display(),
        store_path.display()
    );

    let source = DirectorySource::new(
        logs_dir.clone(),
        settings.file_prefix.clone(),
        settings.listing_order,
    );
    Ok(Processor::new(source, JsonFileStore::new(store_path)))
}

/// Create the directory that will hold `path`, if it has one.
fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
