//! # Whole-Unit Retry
//!
//! Re-runs an entire atomic operation when storage was briefly unavailable.
//!
//! ```text
//! attempt 1 ── Busy ──► wait 20ms ──► attempt 2 ── Busy ──► wait 40ms ──► attempt 3 ── Ok
//!                                                                              │
//! attempt n ── InsufficientStock ──► returned at once (never retried) ◄────────┘
//! ```
//!
//! A failed attempt has already rolled back its transaction, so the next
//! attempt starts from committed state. Nothing is retried part-way.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tracing::warn;

use crate::config::RetrySettings;
use crate::error::EngineResult;

/// Creates the exponential backoff for one operation.
fn create_backoff(settings: &RetrySettings) -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(settings.initial_interval_ms),
        max_interval: Duration::from_millis(settings.max_interval_ms),
        multiplier: 2.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` is reached.
pub async fn with_retry<T, F, Fut>(settings: &RetrySettings, mut op: F) -> EngineResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EngineResult<T>>,
{
    let mut backoff = create_backoff(settings);
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < settings.max_attempts => {
                let Some(delay) = backoff.next_backoff() else {
                    return Err(err);
                };
                warn!(
                    attempt = attempt,
                    max_attempts = settings.max_attempts,
                    ?delay,
                    error = %err,
                    "Transient storage error, retrying operation"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
