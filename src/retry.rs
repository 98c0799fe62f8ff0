//! Retry policy for cluster API calls
//!
//! Bounded attempts with an exponential backoff clamped between a minimum
//! and maximum wait. Only transport-level failures are retried; domain
//! signals (404, 409) and other client errors surface immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::ChaosConfig;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_multiplier: f64,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ChaosConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts,
            backoff_multiplier: config.retry_backoff_multiplier,
            min_wait: config.retry_min_wait(),
            max_wait: config.retry_max_wait(),
        }
    }

    /// Wait before the next attempt: `multiplier * 2^(attempt-1)` seconds,
    /// clamped to `[min_wait, max_wait]`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.backoff_multiplier * 2f64.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(exp.max(0.0)).clamp(self.min_wait, self.max_wait)
    }

    /// Transport failures and server-side throttling retry; domain signals
    /// and other client errors do not.
    pub fn is_retryable(error: &kube::Error) -> bool {
        match error {
            kube::Error::Api(response) => response.code == 429 || response.code >= 500,
            kube::Error::HyperError(_) | kube::Error::Service(_) => true,
            _ => false,
        }
    }

    /// Run `operation` until it succeeds, a non-retryable error occurs, or
    /// the attempt budget runs out. Returns the last error in either failure
    /// case.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> std::result::Result<T, kube::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, kube::Error>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts && Self::is_retryable(&error) => {
                    let wait = self.backoff(attempt);
                    warn!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, self.max_attempts, error, wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use kube::core::ErrorResponse;

    use super::*;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("HTTP {}", code),
            reason: String::new(),
            code,
        })
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::from_config(&ChaosConfig::default())
    }

    #[test]
    fn test_backoff_schedule_clamped() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
        // Clamped to max_wait from here on
        assert_eq!(policy.backoff(5), Duration::from_secs(10));
        assert_eq!(policy.backoff(10), Duration::from_secs(10));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(RetryPolicy::is_retryable(&api_error(500)));
        assert!(RetryPolicy::is_retryable(&api_error(503)));
        assert!(RetryPolicy::is_retryable(&api_error(429)));
        assert!(!RetryPolicy::is_retryable(&api_error(404)));
        assert!(!RetryPolicy::is_retryable(&api_error(409)));
        assert!(!RetryPolicy::is_retryable(&api_error(400)));
        assert!(!RetryPolicy::is_retryable(&api_error(403)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_retries_transport_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, kube::Error> = policy()
            .run(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(api_error(500))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_gives_up_after_budget() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, kube::Error> = policy()
            .run(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(api_error(500)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_retry_domain_errors() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, kube::Error> = policy()
            .run(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(api_error(409)) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
