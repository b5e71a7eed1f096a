//! Shared retry/backoff policy for adapter I/O (§4.1 failure semantics).
//!
//! TRANSIENT and RATE_LIMITED errors are retried with exponential backoff,
//! base 500 ms, factor 2, capped at 30 s, full jitter. AUTH and MALFORMED
//! are not retried: they are fatal for that source on that cycle.

use std::time::Duration;

use rand::Rng;
use syi_core::{AdapterError, AdapterErrorKind};

const BASE: Duration = Duration::from_millis(500);
const CAP: Duration = Duration::from_secs(30);
const FACTOR: u32 = 2;

/// Full-jitter backoff delay for the given zero-based retry attempt.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = BASE.as_millis().saturating_mul(u128::from(FACTOR).saturating_pow(attempt));
    let capped = exp.min(CAP.as_millis());
    let jittered = rand::thread_rng().gen_range(0..=capped.max(1));
    Duration::from_millis(jittered as u64)
}

/// Runs `op` up to `max_attempts` times, backing off between retryable failures.
/// Returns immediately on a non-retryable error or on success.
pub async fn with_retry<T, F, Fut>(max_attempts: u32, mut op: F) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AdapterError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.kind.is_retryable() && attempt + 1 < max_attempts => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    source_id = %err.source_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after {:?} error: {}",
                    err.kind,
                    err.message
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_never_exceeds_cap() {
        for attempt in 0..10 {
            assert!(backoff_delay(attempt) <= CAP);
        }
    }

    #[tokio::test]
    async fn with_retry_stops_on_non_retryable_error() {
        let mut calls = 0;
        let result: Result<(), AdapterError> = with_retry(5, || {
            calls += 1;
            async { Err(AdapterError::new("src", AdapterErrorKind::Auth, "bad key")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: Result<(), AdapterError> = with_retry(3, || {
            calls += 1;
            async { Err(AdapterError::new("src", AdapterErrorKind::Transient, "timeout")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn with_retry_succeeds_eventually() {
        let mut calls = 0;
        let result = with_retry(5, || {
            calls += 1;
            let ok_now = calls >= 2;
            async move {
                if ok_now {
                    Ok(42)
                } else {
                    Err(AdapterError::new("src", AdapterErrorKind::Transient, "timeout"))
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 2);
    }
}
