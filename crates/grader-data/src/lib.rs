//! Data layer for the sensor grader.
//!
//! Parses sensor log files into classified sensor blocks and decides which
//! listed log files still need grading.

pub mod discovery;
pub mod parser;

pub use grader_core as core;
