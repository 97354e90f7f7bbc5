use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use super::FetchError;

/// Exponential backoff with random jitter: `base · 2^attempt + U(0, jitter)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::rng().random_range(0..=jitter_ms)
        };
        backoff + Duration::from_millis(jitter)
    }
}

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, f: F) -> Result<T, FetchError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(val) => return Ok(val),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay(attempt);
                warn!(attempt = attempt + 1, ?delay, "{e}; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
