//! Retry logic with exponential backoff
//!
//! Requests against the vendor API are retried when:
//! - the transport fails (connection refused, reset, per-attempt timeout)
//! - the service answers 429 or 503, honoring a `Retry-After` header
//!
//! Every other response is returned to the caller unchanged. When attempts
//! run out on a transient status, the last response is returned as a
//! response so the test can assert on it.

use crate::error::{ApiResult, ApiTestError};
use crate::http::HttpResponse;
use crate::logging::{log_debug, log_error, log_warn};
use crate::status;

use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Retry policy configuration for API requests
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum total operation time
    pub total_timeout: Duration,
    /// Request timeout for individual attempts
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
            backoff_multiplier: 2.0,
            total_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A single attempt with the default timeouts.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Runs an HTTP operation under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute `operation` until it yields a non-transient outcome or the
    /// policy is exhausted.
    ///
    /// Running out of attempts or of `total_timeout` returns the last
    /// outcome received. `Timeout` is returned only when no attempt
    /// completed.
    pub async fn execute<F, Fut>(&self, operation: F) -> ApiResult<HttpResponse>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<HttpResponse>>,
    {
        let start_time = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        let mut last_outcome = None;

        loop {
            let Some(remaining) = self.remaining_budget(&start_time) else {
                return last_outcome
                    .unwrap_or_else(|| Err(ApiTestError::timeout(self.policy.total_timeout)));
            };
            attempt += 1;

            log_debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                "Executing request with retry logic"
            );

            let attempt_timeout = self.policy.request_timeout.min(remaining);
            let outcome = match tokio::time::timeout(attempt_timeout, operation()).await {
                Ok(outcome) => outcome,
                Err(_elapsed) => Err(ApiTestError::timeout(attempt_timeout)),
            };

            let retry_after = match &outcome {
                Ok(response) if status::is_transient(response.status_code) => {
                    log_warn!(
                        attempt = attempt,
                        status = response.status_code,
                        "Service returned a transient status"
                    );
                    response.retry_after()
                }
                Ok(_) => return outcome,
                Err(error) if error.is_retryable() => None,
                Err(_) => return outcome,
            };

            if attempt >= max_attempts {
                return self.give_up(attempt, &start_time, outcome);
            }

            // No point sleeping past the total budget
            let delay = self.calculate_delay(attempt, retry_after);
            if self
                .remaining_budget(&start_time)
                .map_or(true, |remaining| delay >= remaining)
            {
                return self.give_up(attempt, &start_time, outcome);
            }

            log_debug!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis(),
                "Retrying request after delay"
            );
            last_outcome = Some(outcome);
            sleep(delay).await;
        }
    }

    /// Time left of `total_timeout`, `None` once it is spent.
    fn remaining_budget(&self, start_time: &Instant) -> Option<Duration> {
        self.policy
            .total_timeout
            .checked_sub(start_time.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }

    fn give_up(
        &self,
        attempts: u32,
        start_time: &Instant,
        outcome: ApiResult<HttpResponse>,
    ) -> ApiResult<HttpResponse> {
        match &outcome {
            Ok(response) => log_warn!(
                attempts = attempts,
                status = response.status_code,
                total_duration_ms = start_time.elapsed().as_millis(),
                "Retries exhausted, returning last transient response"
            ),
            Err(error) => log_error!(
                attempts = attempts,
                total_duration_ms = start_time.elapsed().as_millis(),
                error = %error,
                "Request failed after all retry attempts"
            ),
        }
        outcome
    }

    /// Delay before the retry following `attempt` (1-based).
    ///
    /// A server-provided `Retry-After` replaces the backoff but is still
    /// capped at `max_delay`.
    pub fn calculate_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let max_delay = self.policy.max_delay.as_secs_f64();

        if let Some(retry_after) = retry_after {
            return Duration::from_secs_f64(retry_after.as_secs_f64().min(max_delay));
        }

        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let delay_seconds = (self.policy.initial_delay.as_secs_f64()
            * self.policy.backoff_multiplier.powi(exponent))
        .min(max_delay)
        .max(0.0);

        // Up to 10% jitter
        let jitter = fastrand::f64() * 0.1;
        Duration::from_secs_f64(delay_seconds * (1.0 + jitter))
    }
}
