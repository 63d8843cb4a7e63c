//! Retry policy and the retry loop wrapped around each request

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Result;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`)
    pub max_retries: u32,
    /// Delay cap for the first retry
    #[serde(with = "duration_ms")]
    pub initial_delay: Duration,
    /// Upper bound for any delay cap
    #[serde(with = "duration_ms")]
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy that performs exactly one attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Set the number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial and maximum delay caps
    pub fn with_delays(mut self, initial_delay: Duration, max_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.max_delay = max_delay;
        self
    }

    /// Set the backoff multiplier
    pub fn with_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Calculate the exponential delay cap for the given attempt index
    ///
    /// `min(initial_delay * backoff_multiplier^attempt, max_delay)`
    pub fn capped_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let max_ms = self.max_delay.as_millis() as f64;

        // powi overflows to infinity for large attempts; the cap still applies
        Duration::from_millis(delay_ms.min(max_ms).max(0.0) as u64)
    }

    /// Draw the actual wait before the next attempt (full jitter)
    ///
    /// Uniform in `[0, capped_delay(attempt)]`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let cap = self.capped_delay(attempt).as_millis() as u64;
        if cap == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=cap))
    }
}

/// Retry middleware for HTTP operations
pub struct RetryMiddleware {
    policy: RetryPolicy,
}

impl RetryMiddleware {
    /// Create new retry middleware
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Execute operation with retry logic
    ///
    /// The operation receives the zero-based attempt index. Non-retryable
    /// errors and the error of the final attempt are returned as-is.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation(attempt).await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "Request succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if !e.is_retryable() {
                        debug!(kind = %e.kind(), error = %e, "Non-retryable error");
                        return Err(e);
                    }

                    if attempt >= self.policy.max_retries {
                        warn!(
                            attempts = attempt + 1,
                            error = %e,
                            "Retry limit reached"
                        );
                        return Err(e);
                    }

                    let delay = self.policy.jittered_delay(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.policy.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Serde helpers storing a [`Duration`] as integer milliseconds
pub(crate) mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
