//! Retry policy for image generation requests.

use std::future::Future;
use std::time::Duration;

use autocut_common::config::GenerationDefaults;

use crate::generator::GenerationError;

/// Statuses worth retrying: rate limiting and transient server errors.
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Status a loading model answers with.
const LOADING_STATUS: u16 = 503;

/// How generation requests are retried.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per request, including the first one.
    pub max_attempts: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    pub retryable_statuses: Vec<u16>,
    /// Wait used for a loading model that gives no estimate.
    pub default_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&GenerationDefaults::default())
    }
}

impl From<&GenerationDefaults> for RetryPolicy {
    fn from(defaults: &GenerationDefaults) -> Self {
        Self {
            max_attempts: defaults.max_attempts.max(1),
            base_delay: Duration::from_millis(defaults.base_delay_ms),
            max_delay: Duration::from_millis(defaults.max_delay_ms),
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
            default_wait: Duration::from_millis(defaults.default_wait_ms),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `attempt + 1`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    pub fn is_retryable(&self, err: &GenerationError) -> bool {
        match err {
            GenerationError::Status { code, .. } => self.retryable_statuses.contains(code),
            GenerationError::Transport(_) => true,
            GenerationError::Fatal(_) => false,
        }
    }

    /// Wait after a failed attempt. A server estimate wins over backoff.
    pub fn delay_after(&self, attempt: u32, err: &GenerationError) -> Duration {
        match err {
            GenerationError::Status {
                retry_after: Some(wait),
                ..
            } => (*wait).min(self.max_delay),
            GenerationError::Status {
                code: LOADING_STATUS,
                retry_after: None,
            } => self.default_wait.min(self.max_delay),
            _ => self.delay_for_attempt(attempt),
        }
    }

    /// Run `op` until it succeeds, fails fatally, or attempts run out.
    ///
    /// `op` receives the 0-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, GenerationError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::debug!(label, attempts = attempt + 1, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let retryable = self.is_retryable(&err);
                    if !retryable || attempt + 1 >= max_attempts {
                        tracing::warn!(
                            label,
                            attempts = attempt + 1,
                            retryable,
                            error = %err,
                            "Giving up"
                        );
                        return Err(err);
                    }

                    let delay = self.delay_after(attempt, &err);
                    tracing::warn!(
                        label,
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
