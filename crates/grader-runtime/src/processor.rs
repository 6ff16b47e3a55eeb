//! One discovery → fetch → grade → record step.
//!
//! [`Processor::run_cycle`] grades at most one file: the oldest listed file
//! the store has no record of. A parse failure is recorded under the file's
//! key like a success so a permanently malformed file is not retried
//! forever. Content that is not valid UTF-8 is such a parse failure.
//! Listing, lookup and fetch failures are returned without touching the
//! store so the file stays eligible on the next poll.

use std::fmt;

use grader_core::error::Result;
use grader_core::formatting::format_report;
use grader_core::store::ResultStore;
use grader_data::discovery::{find_oldest_unprocessed, find_unprocessed_prefix};
use grader_data::parser::parse_reader;
use tracing::{debug, info, warn};

use crate::source::LogSource;

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing left to grade.
    Idle,
    /// `file` was graded and `output` recorded for it.
    Graded { file: String, output: String },
    /// `file` was rejected and the error text recorded for it.
    Rejected { file: String, error: String },
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "no new log file"),
            Self::Graded { file, .. } => write!(f, "graded {file}"),
            Self::Rejected { file, error } => write!(f, "rejected {file}: {error}"),
        }
    }
}

/// Couples a log source with the shared result store.
pub struct Processor<S, R> {
    source: S,
    store: R,
}

impl<S: LogSource, R: ResultStore> Processor<S, R> {
    pub fn new(source: S, store: R) -> Self {
        Self { source, store }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// Listed files the store has no record of, newest first.
    pub fn pending(&self) -> Result<Vec<String>> {
        let listing = self.source.list()?;
        let prefix = find_unprocessed_prefix(listing, &self.store)?;
        debug!(?prefix, "unprocessed log files");
        Ok(prefix)
    }

    /// Grade the oldest unprocessed file, if any.
    pub fn run_cycle(&self) -> Result<CycleOutcome> {
        let pending = self.pending()?;
        if pending.is_empty() {
            return Ok(CycleOutcome::Idle);
        }

        let Some(file) = find_oldest_unprocessed(&pending, &self.store)? else {
            return Ok(CycleOutcome::Idle);
        };

        let content = self.source.fetch(&file)?;

        match parse_reader(content.as_slice()) {
            Ok(parsed) => {
                let output = format_report(&parsed.report())?;
                self.store.set(&file, &output)?;
                info!(file = %file, sensors = parsed.sensors.len(), "log file graded");
                Ok(CycleOutcome::Graded { file, output })
            }
            Err(e) => {
                let error = e.to_string();
                warn!(file = %file, error = %error, "log file rejected");
                self.store.set(&file, &error)?;
                Ok(CycleOutcome::Rejected { file, error })
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
