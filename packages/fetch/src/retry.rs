//! Bounded retry with exponential backoff for transient download failures.
//!
//! Retrying is off unless a policy with `max_retries > 0` is configured.
//! Only failures for which [`DownloadError::is_transient`] holds are
//! retried; HTTP 4xx other than 429 is permanent.

use std::future::Future;
use std::time::Duration;

use crate::DownloadError;

/// How many times, and how patiently, to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Default delay before the first retry.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Self::DEFAULT_BASE_DELAY)
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
    }

    /// Runs `op`, retrying transient failures up to `max_retries` times.
    ///
    /// `op` is called once per attempt so that every attempt starts from a
    /// fresh request.
    ///
    /// # Errors
    ///
    /// Returns the last [`DownloadError`] once the error is permanent or
    /// the retries are exhausted.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, DownloadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DownloadError>>,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay(attempt);
                    log::warn!("  transient error: {e}");
                    log::warn!("  retry {attempt}/{} in {delay:?}...", self.max_retries);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(8));
    }

    #[test]
    fn classifies_statuses() {
        let status = |status| DownloadError::HttpStatus {
            url: "https://example.com".to_owned(),
            status,
        };
        assert!(status(429).is_transient());
        assert!(status(502).is_transient());
        assert!(!status(404).is_transient());
        assert!(!status(403).is_transient());
    }

    #[tokio::test]
    async fn default_policy_gives_up_immediately() {
        let mut calls = 0;
        let result: Result<(), _> = RetryPolicy::default()
            .run(|| {
                calls += 1;
                async {
                    Err(DownloadError::HttpStatus {
                        url: "https://example.com".to_owned(),
                        status: 503,
                    })
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
