//! Explicit instrumentation wrapper for store operations.
//!
//! Composed at the call site around each repository method, so the timing
//! and final-failure logging are visible where the operation is invoked
//! instead of hiding behind hook registration.

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error};

/// Awaits `operation`, emitting a structured `{event, duration_ms}` record
/// on success and an error-level record with the failure on the final error.
pub async fn timed<T, E, Fut>(event: &str, operation: Fut) -> Result<T, E>
where
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    let started = Instant::now();
    let result = operation.await;
    let duration_ms = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => debug!(event, duration_ms, "operation completed"),
        Err(err) => error!(event, duration_ms, error = %err, "operation failed"),
    }
    result
}
