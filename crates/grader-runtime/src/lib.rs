//! Runtime layer for the sensor grader.
//!
//! Wires a log source and the shared result store into single grading
//! cycles and runs those cycles on a polling interval with graceful
//! shutdown.

pub mod orchestrator;
pub mod processor;
pub mod source;
pub mod store;

pub use grader_core as core;
pub use grader_data as data;
