//! Capped exponential-backoff retry, shared by both analysis paths.

use curator_config::PipelineConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Retry an async operation a fixed number of attempts, multiplying the
/// delay between attempts. Both transient and persistent service errors run
/// through the same loop; the caller decides what exhaustion means.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            multiplier,
            max_delay,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.initial_delay_seconds),
            config.delay_multiplier,
            Duration::from_secs(config.max_delay_seconds),
        )
    }

    /// Run `f` until it succeeds or attempts are exhausted, returning the
    /// last error.
    pub async fn run<F, Fut, T, E>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut delay = self.initial_delay;

        for attempt in 1..=self.max_attempts {
            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(operation, attempts = attempt, "Operation succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if attempt == self.max_attempts {
                        warn!(
                            operation,
                            attempts = attempt,
                            error = %e,
                            "Operation failed after max attempts"
                        );
                        return Err(e);
                    }

                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Operation failed, retrying"
                    );
                    sleep(delay).await;
                    delay = Duration::from_secs_f64(
                        (delay.as_secs_f64() * self.multiplier).min(self.max_delay.as_secs_f64()),
                    );
                }
            }
        }

        unreachable!("retry loop always returns from its last attempt")
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
