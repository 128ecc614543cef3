//! Bounded exponential-backoff retry for data operations.
//!
//! The executor reruns a caller-supplied operation until it succeeds, the
//! attempt bound is reached, or the error turns out not to be transient.
//! The final attempt's error is returned exactly as the operation produced
//! it; there is no wrapping in a placeholder error.

use crate::error::StoreError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Total attempts per operation, counting the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const BASE_BACKOFF_MS: u64 = 1_000;
const MAX_BACKOFF_MS: u64 = 10_000;

/// Marks which errors are worth another attempt. Permanent failures
/// (validation, not-found) short-circuit the retry loop immediately.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

/// Delay before the attempt that follows failed attempt `attempt`
/// (1-based): 2s after the first failure, 4s after the second, capped
/// at 10s.
fn backoff_after(attempt: u32) -> Duration {
    let millis = BASE_BACKOFF_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS);
    Duration::from_millis(millis)
}

/// Runs `operation` up to `max_attempts` times, sleeping between attempts.
///
/// The first success short-circuits all remaining attempts. On failure the
/// operation's own error is propagated once the bound is exhausted or the
/// error is not transient.
pub async fn execute_with_retry<T, E, F, Fut>(
    op_name: &str,
    max_attempts: u32,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Transient + Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_transient() => {
                warn!(
                    op = op_name,
                    attempt,
                    max_attempts,
                    error = %err,
                    "operation failed, retrying"
                );
                tokio::time::sleep(backoff_after(attempt)).await;
                attempt += 1;
            }
            Err(err) => {
                error!(op = op_name, attempt, error = %err, "operation failed");
                return Err(err);
            }
        }
    }
}
