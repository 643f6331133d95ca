use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE: Duration = Duration::from_secs(2);

/// Shared retry wrapper for outbound LLM calls: exponential backoff
/// (base * 3^attempt + jitter) on transient failures and rate limiting,
/// bounded at `MAX_ATTEMPTS`. Callers get back the last error if every
/// attempt is exhausted.
pub async fn llm_call<T, F, Fut>(label: &str, mut call: F) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut last_err = None;

    for attempt in 0..MAX_ATTEMPTS {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_retryable(&e) || attempt + 1 == MAX_ATTEMPTS {
                    return Err(e);
                }
                let backoff = RETRY_BASE * 3u32.pow(attempt);
                let jitter = Duration::from_millis(rand::rng().random_range(0..500));
                warn!(
                    call = label,
                    attempt = attempt + 1,
                    backoff_secs = backoff.as_secs(),
                    error = %e,
                    "retrying after transient failure"
                );
                tokio::time::sleep(backoff + jitter).await;
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{label} failed with no recorded error")))
}

/// Vendor clients surface failures as `newsroom_common::Error`, which already
/// knows whether it's worth retrying; an error that isn't one of those
/// variants (a bug, a deserialization error, ...) is never retried.
fn is_retryable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<newsroom_common::Error>()
        .is_some_and(|e| e.is_retryable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_failure_then_succeeds() {
        let attempts = AtomicU32::new(0);
        let result = llm_call("test", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(newsroom_common::Error::RateLimited("429 Too Many Requests".into()).into())
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_returns_immediately() {
        let attempts = AtomicU32::new(0);
        let result: anyhow::Result<()> = llm_call("test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(newsroom_common::Error::Schema("invalid schema".into()).into()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unrecognized_error_type_is_not_retried() {
        let attempts = AtomicU32::new(0);
        let result: anyhow::Result<()> = llm_call("test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("connection reset by peer")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
