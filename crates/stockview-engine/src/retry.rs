//! Retry with exponential backoff for transient upstream failures.
//!
//! Only transport-level conditions are retried here. Whole-reconciliation
//! retries are left to the caller.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable: [`FetchError::RateLimited`] (HTTP 429), [`FetchError::Http`]
/// (connection reset, timeout), and 5xx [`FetchError::UnexpectedStatus`].
/// Everything else is returned immediately.
fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::RateLimited { .. } | FetchError::Http(_) => true,
        FetchError::UnexpectedStatus { status, .. } => *status >= 500,
        FetchError::NotFound { .. }
        | FetchError::InvalidUrl { .. }
        | FetchError::InvalidHeader { .. } => false,
    }
}

/// How long to wait before retry number `attempt + 1`.
///
/// Exponential in `attempt` starting from `backoff_base_secs`. A rate-limited
/// response never waits less than its `Retry-After`.
fn retry_delay(err: &FetchError, attempt: u32, backoff_base_secs: u64) -> Duration {
    let exponential =
        Duration::from_secs(backoff_base_secs).saturating_mul(2u32.saturating_pow(attempt));
    match err {
        FetchError::RateLimited {
            retry_after_secs, ..
        } => exponential.max(Duration::from_secs(*retry_after_secs)),
        _ => exponential,
    }
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// has been retried `max_retries` times. With `max_retries = 3` the operation
/// runs at most 4 times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut retries_used = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if retries_used < max_retries && is_retriable(&err) => {
                let delay = retry_delay(&err, retries_used, backoff_base_secs);
                retries_used += 1;
                tracing::warn!(
                    retry = retries_used,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "upstream request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn rate_limited() -> FetchError {
        FetchError::RateLimited {
            url: "http://upstream.test/availability/reps".to_owned(),
            retry_after_secs: 0,
        }
    }

    fn status(status: u16) -> FetchError {
        FetchError::UnexpectedStatus {
            status,
            url: "http://upstream.test/products/jackets".to_owned(),
        }
    }

    async fn count_calls(
        max_retries: u32,
        mut make: impl FnMut(u32) -> Result<u32, FetchError>,
    ) -> (Result<u32, FetchError>, u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let result = retry_with_backoff(max_retries, 0, || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            let outcome = make(n);
            async move { outcome }
        })
        .await;
        (result, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let (result, calls) = count_calls(3, |_| Ok(42)).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn retries_on_rate_limited_then_succeeds() {
        let (result, calls) =
            count_calls(3, |n| if n < 2 { Err(rate_limited()) } else { Ok(99) }).await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn retries_server_errors() {
        let (result, calls) =
            count_calls(1, |n| if n == 0 { Err(status(503)) } else { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn propagates_last_error_after_exhausting_retries() {
        let (result, calls) = count_calls(2, |_| Err(rate_limited())).await;
        assert_eq!(calls, 3);
        assert!(matches!(result, Err(FetchError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let (result, calls) = count_calls(3, |_| Err(status(403))).await;
        assert_eq!(calls, 1);
        assert!(matches!(
            result,
            Err(FetchError::UnexpectedStatus { status: 403, .. })
        ));
    }

    #[test]
    fn delay_doubles_from_the_base() {
        assert_eq!(retry_delay(&status(502), 0, 2), Duration::from_secs(2));
        assert_eq!(retry_delay(&status(502), 1, 2), Duration::from_secs(4));
        assert_eq!(retry_delay(&status(502), 3, 2), Duration::from_secs(16));
        assert_eq!(retry_delay(&status(502), 5, 0), Duration::ZERO);
    }

    #[test]
    fn delay_saturates_instead_of_overflowing() {
        assert_eq!(retry_delay(&status(500), 200, u64::MAX), Duration::MAX);
    }

    #[test]
    fn rate_limit_waits_at_least_retry_after() {
        let err = FetchError::RateLimited {
            url: "http://upstream.test/availability/reps".to_owned(),
            retry_after_secs: 30,
        };
        assert_eq!(retry_delay(&err, 0, 1), Duration::from_secs(30));
        assert_eq!(retry_delay(&err, 6, 1), Duration::from_secs(64));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_for_retry_after_before_retrying() {
        let started = tokio::time::Instant::now();
        let (result, calls) = count_calls(1, |n| {
            if n == 0 {
                Err(FetchError::RateLimited {
                    url: "http://upstream.test/products/jackets".to_owned(),
                    retry_after_secs: 3,
                })
            } else {
                Ok(1)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls, 2);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn does_not_retry_not_found() {
        let (result, calls) = count_calls(3, |_| {
            Err(FetchError::NotFound {
                url: "http://upstream.test/products/hats".to_owned(),
            })
        })
        .await;
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(FetchError::NotFound { .. })));
    }
}
