//! Bounded retry with capped exponential backoff

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, warn};

use super::planner::{PackageAction, PackagePublishResult};

/// Retry policy for a single package action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first (0 is treated as 1)
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    #[serde(rename = "initial_delay_ms", with = "super::millis")]
    pub initial_delay: Duration,
    /// Factor applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay
    #[serde(rename = "max_delay_ms", with = "super::millis")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Number of attempts actually made
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay slept after failed attempt `attempt` (1-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.max(0.0).powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delays between attempts; one fewer than the number of attempts
    pub fn delays(&self) -> Vec<Duration> {
        (1..self.attempts())
            .map(|attempt| self.delay_for_attempt(attempt))
            .collect()
    }
}

/// Run `action` for `package` until it succeeds or attempts run out.
///
/// Never fails: exhausting every attempt yields an unsuccessful result
/// carrying the last error. `duration` covers only the successful attempt.
pub async fn publish_with_retry<A>(
    package: &str,
    action: &A,
    config: &RetryConfig,
) -> PackagePublishResult
where
    A: PackageAction + ?Sized,
{
    let attempts = config.attempts();
    let mut last_error = None;

    for attempt in 1..=attempts {
        let started = Instant::now();
        match action.run(package).await {
            Ok(()) => {
                let duration = started.elapsed();
                debug!(package, attempt, duration_ms = duration.as_millis() as u64, "action succeeded");
                return PackagePublishResult {
                    package: package.to_string(),
                    success: true,
                    error: None,
                    duration,
                    timestamp: Utc::now(),
                };
            }
            Err(e) => {
                warn!(package, attempt, max_attempts = attempts, error = %e, "action failed");
                last_error = Some(format!("{:#}", e));

                if attempt < attempts {
                    tokio::time::sleep(config.delay_for_attempt(attempt)).await;
                }
            }
        }
    }

    PackagePublishResult {
        package: package.to_string(),
        success: false,
        error: last_error,
        duration: Duration::ZERO,
        timestamp: Utc::now(),
    }
}
