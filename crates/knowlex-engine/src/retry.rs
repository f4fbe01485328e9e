//! Retry-on-conflict for read-check-then-write operations
//!
//! Lifecycle operations check preconditions against a snapshot of the store
//! and then commit. A concurrent writer can slip in between; the store's
//! unique index turns that into a `Conflict`, and the whole operation is
//! re-run from a fresh read.

#![allow(clippy::result_large_err)]

use knowlex_core::errors::ExError;

/// Run `op`, re-running it up to `retries` more times while it fails with a
/// retryable error
///
/// `op` receives the zero-based attempt number.
///
/// # Errors
///
/// The last error, or the first non-retryable one.
pub fn with_conflict_retry<T, F>(op_name: &str, retries: u32, mut op: F) -> Result<T, ExError>
where
    F: FnMut(u32) -> Result<T, ExError>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Err(err) if err.kind().is_retryable() && attempt < retries => {
                tracing::warn!(
                    op = op_name,
                    attempt,
                    err.code = err.code(),
                    "conflict, retrying"
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}
