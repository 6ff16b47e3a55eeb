//! Core domain for the sensor grader.
//!
//! Holds the log-file domain types, the per-kind classification rules, the
//! canonical report formatter, the result-store abstraction shared by every
//! grader instance, and the command-line settings.

pub mod classifier;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod store;

pub use error::{GraderError, ParseError, Result, SourceError, StoreError};
