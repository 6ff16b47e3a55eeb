//! Listing provider and file fetcher.
//!
//! [`LogSource`] is the seam between the grader and wherever the log files
//! live. [`DirectorySource`] serves them from a local or mounted directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use grader_core::error::SourceError;
use grader_core::settings::ListingOrder;
use tracing::{debug, warn};

/// Lists candidate log files and hands out their contents.
pub trait LogSource {
    /// Candidate file names, newest first.
    ///
    /// Discovery trusts this order: once a listed file is found in the
    /// result store, every file after it is assumed recorded as well.
    fn list(&self) -> Result<Vec<String>, SourceError>;

    /// Raw contents of the named log file.
    ///
    /// Content is not decoded here: undecodable text is a property of the
    /// file, reported by the parser, not a transport failure.
    fn fetch(&self, name: &str) -> Result<Vec<u8>, SourceError>;
}

// ── DirectorySource ───────────────────────────────────────────────────────────

/// Serves log files stored directly inside one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    prefix: String,
    order: ListingOrder,
}

impl DirectorySource {
    /// # Parameters
    /// - `root`   – directory holding the log files (not searched recursively).
    /// - `prefix` – only files whose name starts with this are listed.
    /// - `order`  – how the listing is put into newest-first order.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, order: ListingOrder) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            order,
        }
    }

    fn unreachable(&self, source: std::io::Error) -> SourceError {
        SourceError::Unreachable {
            location: self.root.display().to_string(),
            source,
        }
    }
}

impl LogSource for DirectorySource {
    fn list(&self) -> Result<Vec<String>, SourceError> {
        if !self.root.is_dir() {
            return Err(self.unreachable(std::io::Error::new(
                ErrorKind::NotFound,
                "not a directory",
            )));
        }

        let mut files: Vec<(String, SystemTime)> = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| self.unreachable(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                warn!("Skipping non UTF-8 file name in {}", self.root.display());
                continue;
            };
            if !name.starts_with(&self.prefix) {
                continue;
            }
            let modified = match self.order {
                ListingOrder::Modified => entry
                    .metadata()
                    .map_err(|e| self.unreachable(e.into()))?
                    .modified()
                    .map_err(|e| self.unreachable(e))?,
                ListingOrder::Name => SystemTime::UNIX_EPOCH,
            };
            files.push((name.to_string(), modified));
        }

        // Name breaks ties between equal modification times.
        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        debug!(
            "Listed {} log file(s) in {}",
            files.len(),
            self.root.display()
        );
        Ok(files.into_iter().map(|(name, _)| name).collect())
    }

    fn fetch(&self, name: &str) -> Result<Vec<u8>, SourceError> {
        // Names come from the listing; anything that would escape the root
        // cannot be one of them.
        if name.is_empty() || Path::new(name).components().count() != 1 || name == ".." {
            return Err(SourceError::NotFound(name.to_string()));
        }
        let path = self.root.join(name);
        std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => SourceError::NotFound(name.to_string()),
            _ => SourceError::Fetch {
                name: name.to_string(),
                source,
            },
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
