//! Bounded retry with exponential backoff
//!
//! Wraps a single network operation. Only transient failures (connectivity,
//! timeout) trigger a retry; deterministic rejections propagate on first
//! occurrence so a doomed call is not replayed uselessly and slowly.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetrySettings;
use crate::error::{LedgerError, Result};

impl RetrySettings {
    /// Backoff delay for a given attempt (0-indexed): base * 2^attempt,
    /// capped, with jitter to avoid thundering herd.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = (self.base_delay_ms as f64) * 2f64.powi(attempt as i32);
        let capped = exp.min(self.max_delay_ms as f64);

        let mut rng = rand::thread_rng();
        let jitter_range = capped * self.jitter_factor;
        let jitter = if jitter_range > 0.0 {
            rng.gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

/// Retry an async operation according to the provided settings.
///
/// On success after a retry the recovery is logged. When every attempt has
/// failed the returned error carries the attempt count and the last
/// underlying cause.
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    settings: &RetrySettings,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..settings.max_attempts {
        if attempt > 0 {
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                max_attempts = settings.max_attempts,
                "Retrying operation"
            );
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable() {
                    warn!(
                        operation = operation_name,
                        category = err.category(),
                        error = %err,
                        "Terminal error, not retrying"
                    );
                    return Err(err);
                }

                last_error = Some(err);

                if attempt + 1 < settings.max_attempts {
                    let backoff = settings.backoff_delay(attempt);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "Transient error, backing off before retry"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    let last = last_error
        .unwrap_or_else(|| LedgerError::Unknown("retry exhausted without error".to_string()));
    warn!(
        operation = operation_name,
        attempts = settings.max_attempts,
        error = %last,
        "All retry attempts exhausted"
    );
    Err(LedgerError::retries_exhausted(settings.max_attempts, last))
}
