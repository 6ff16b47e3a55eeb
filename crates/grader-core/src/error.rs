use std::num::ParseFloatError;
use std::path::PathBuf;
use thiserror::Error;

/// Reasons a sensor log file is rejected.
///
/// Every variant is terminal for the file being parsed: no partial result
/// is produced. Line numbers are 1-based.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The log file could not be opened.
    #[error("error opening file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `reference` line did not carry exactly a temperature and a humidity.
    #[error("line {line}: reference line has incorrect number of fields")]
    WrongNumberRefFields { line: usize },

    #[error("line {line}: failed converting reference temperature to float: {source}")]
    TempNotFloat {
        line: usize,
        #[source]
        source: ParseFloatError,
    },

    #[error("line {line}: failed converting reference humidity to float: {source}")]
    HumidityNotFloat {
        line: usize,
        #[source]
        source: ParseFloatError,
    },

    /// A sensor header keyword appeared without a sensor name.
    #[error("line {line}: sensor header is missing the sensor name")]
    MissingSensorName { line: usize },

    /// A reading line did not consist of exactly a timestamp and a value.
    #[error("line {line}: line with readings has incorrect number of fields")]
    WrongNumberReadingFields { line: usize },

    #[error("line {line}: failed converting current reading to float: {source}")]
    ReadingNotFloat {
        line: usize,
        #[source]
        source: ParseFloatError,
    },

    /// The underlying reader failed mid-file.
    #[error("error reading the file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the dedup/result store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("result store I/O failure at {path}: {source}")]
    Backend {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted store document is not a flat string-to-string object.
    #[error("result store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An in-process store lock was poisoned by a panicking writer.
    #[error("result store lock poisoned")]
    Poisoned,
}

/// Failures of the listing provider or file fetcher.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The listing could not be produced at all.
    #[error("listing {location} is unreachable: {source}")]
    Unreachable {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("failed fetching {name}: {source}")]
    Fetch {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// All errors produced by the sensor grader.
#[derive(Error, Debug)]
pub enum GraderError {
    /// A log file was rejected by the parser.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A lookup or write against the result store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Listing or fetching log files failed.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// A grade report could not be rendered as JSON.
    #[error("Failed to serialise result: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the grader crates.
pub type Result<T> = std::result::Result<T, GraderError>;
