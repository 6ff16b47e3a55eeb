//! Unprocessed log file discovery.
//!
//! Candidates arrive newest first. Because files are graded oldest first and
//! each graded file is recorded in the result store, the first candidate
//! found in the store marks the boundary: every older candidate is already
//! recorded too. Discovery therefore costs one lookup per new file plus one,
//! never one per file ever listed.

use grader_core::error::StoreError;
use grader_core::store::ResultStore;
use tracing::{debug, trace};

/// Collect the leading run of `candidates` (newest first) that the store has
/// no record of.
///
/// Stops at the first recorded candidate without querying anything after it.
/// A store failure aborts the scan.
pub fn find_unprocessed_prefix<I, S, R>(candidates: I, store: &R) -> Result<Vec<String>, StoreError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    R: ResultStore + ?Sized,
{
    let mut prefix = Vec::new();
    for candidate in candidates {
        let candidate = candidate.into();
        if store.is_processed(&candidate)? {
            debug!(boundary = %candidate, new = prefix.len(), "reached first processed file");
            return Ok(prefix);
        }
        trace!(file = %candidate, "unprocessed");
        prefix.push(candidate);
    }
    debug!(new = prefix.len(), "listing exhausted without a processed file");
    Ok(prefix)
}

/// Pick the oldest file in `prefix` that is still unrecorded.
///
/// `prefix` is newest first, so it is walked from the back. Each file is
/// looked up again because another grader may have recorded it since the
/// prefix was built. Returns `None` when every file has been recorded.
pub fn find_oldest_unprocessed<R>(prefix: &[String], store: &R) -> Result<Option<String>, StoreError>
where
    R: ResultStore + ?Sized,
{
    for candidate in prefix.iter().rev() {
        if !store.is_processed(candidate)? {
            return Ok(Some(candidate.clone()));
        }
        debug!(file = %candidate, "recorded since discovery; skipping");
    }
    Ok(None)
}
