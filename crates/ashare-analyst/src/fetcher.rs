//! Paced retry around remote calls
//!
//! Every provider call goes through [`RetryPolicy`]: a short pacing sleep
//! before each attempt keeps consecutive requests under the provider quota,
//! and a fixed delay separates failed attempts.

use crate::config::AnalystConfig;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one
    pub max_attempts: u32,

    /// Wait before every attempt
    pub pacing: Duration,

    /// Wait after a failed attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pacing: Duration::from_millis(100),
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    pub fn new(max_attempts: u32, pacing: Duration, delay: Duration) -> Self {
        Self {
            max_attempts,
            pacing,
            delay,
        }
    }

    /// Policy taken from the pipeline configuration
    pub fn from_config(config: &AnalystConfig) -> Self {
        Self::new(config.max_attempts, config.pacing_delay, config.retry_delay)
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            pacing: Duration::ZERO,
            delay: Duration::ZERO,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            pacing: Duration::ZERO,
            delay: Duration::from_millis(1),
        }
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// Returns the last error when every attempt failed.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if !self.pacing.is_zero() {
                sleep(self.pacing).await;
            }

            debug!(operation_name, attempt, attempts, "calling provider");

            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation_name, attempt, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => {
                    let remaining = attempts - attempt;
                    warn!(
                        operation_name,
                        remaining,
                        error = %e,
                        "request failed, {remaining} retries left"
                    );
                    if remaining == 0 {
                        return Err(e);
                    }
                    sleep(self.delay).await;
                }
            }
        }
    }

    /// Like [`execute`](Self::execute) but degrades to an empty row set.
    ///
    /// The last error is logged and dropped; callers that need it use
    /// `execute` directly.
    pub async fn fetch_or_empty<F, Fut, T>(&self, operation_name: &str, operation: F) -> Vec<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        match self.execute(operation_name, operation).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(
                    operation_name,
                    attempts = self.max_attempts,
                    error = %e,
                    "giving up, continuing with an empty dataset"
                );
                Vec::new()
            }
        }
    }
}
