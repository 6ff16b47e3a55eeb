use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GraderError, Result};

/// Default filename prefix that marks a candidate log file.
pub const DEFAULT_FILE_PREFIX: &str = "log-";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Grade sensor log files and record each outcome in a shared result store
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sensor-grader",
    about = "Grade sensor log files and record each outcome in a shared result store",
    version
)]
pub struct Settings {
    /// Directory that lists and serves the log files
    #[arg(long, env = "REMOTE_LOGS_DIR", global = true)]
    pub logs_dir: Option<PathBuf>,

    /// Result store file (defaults to ~/.sensor-grader/results.json)
    #[arg(long, env = "GRADER_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Filename prefix identifying log files
    #[arg(long, default_value = DEFAULT_FILE_PREFIX, global = true)]
    pub file_prefix: String,

    /// How the listing is put into newest-first order
    #[arg(long, value_enum, default_value_t = ListingOrder::Name, global = true)]
    pub listing_order: ListingOrder,

    /// Seconds between polls (1-3600)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..=3600), global = true)]
    pub poll_interval: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"], global = true)]
    pub log_level: String,

    /// Log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What the grader should do.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Poll the logs directory until interrupted
    Watch,
    /// Run a single discovery-and-grade cycle
    Once,
    /// Print the log files not yet recorded in the store, newest first
    Pending,
    /// Grade one local log file and print the result
    Grade {
        /// Path of the log file
        file: PathBuf,
    },
}

/// Newest-first ordering strategy for a directory listing.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingOrder {
    /// Descending file name (timestamped names sort newest first)
    #[default]
    Name,
    /// Descending modification time
    Modified,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] over an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Subcommand to run; `watch` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// The logs directory, required by every store-backed command.
    pub fn require_logs_dir(&self) -> Result<&PathBuf> {
        self.logs_dir.as_ref().ok_or_else(|| {
            GraderError::Config(
                "remote directory with log files not provided (--logs-dir or REMOTE_LOGS_DIR)"
                    .to_string(),
            )
        })
    }

    /// Resolve the result store path, falling back to
    /// `~/.sensor-grader/results.json`.
    pub fn store_path(&self) -> PathBuf {
        match &self.store {
            Some(p) => p.clone(),
            None => Self::default_store_path_in(
                &dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            ),
        }
    }

    /// The default store path rooted at `base_dir` (used for testing).
    pub fn default_store_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".sensor-grader").join("results.json")
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
