//! Bounded exponential backoff with random jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RetryConfig;

/// How often and how patiently to retry a failing call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Lower bound of every wait.
    pub min_wait: Duration,
    /// Upper bound (exclusive) of every wait.
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            min_wait: config.min_wait(),
            max_wait: config.max_wait().max(config.min_wait()),
        }
    }
}

impl RetryPolicy {
    /// Ceiling of the jitter window after `failures` failed attempts:
    /// `min(max_wait, min_wait * 2^failures)`.
    pub fn ceiling(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures.min(31)).unwrap_or(u32::MAX);
        self.min_wait
            .checked_mul(factor)
            .unwrap_or(self.max_wait)
            .min(self.max_wait)
    }

    /// Random wait in `[min_wait, ceiling(failures))`.
    pub fn delay(&self, failures: u32) -> Duration {
        let ceiling = self.ceiling(failures);
        if ceiling <= self.min_wait {
            return self.min_wait;
        }
        rand::rng().random_range(self.min_wait..ceiling)
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable` rejects, or
    /// `max_attempts` attempts have been made. Returns the last error on exhaustion.
    pub async fn run<F, Fut, T, E>(
        &self,
        mut operation: F,
        is_retryable: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    warn!(attempts = attempt, error = %e, "giving up after retries");
                    return Err(e);
                }
                Err(e) => {
                    let wait = self.delay(attempt);
                    debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
