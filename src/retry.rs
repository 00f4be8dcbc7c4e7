//! Retry with exponential backoff for provider calls.
//!
//! Every call that crosses a process boundary to an external provider
//! (embedding, reranking, generation) is wrapped in [`with_retry`] with an
//! explicit [`RetryPolicy`]. The policy is plain data, so tests can inject
//! [`RetryPolicy::no_retry`] and stay free of wall-clock sleeps.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::Result;

/// Parameters of the backoff curve applied to retryable provider failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryPolicy {
    /// Number of extra attempts after the first failure.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub exponential_base: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            exponential_base: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries and never sleeps.
    pub fn no_retry() -> Self {
        Self { max_retries: 0, initial_delay: Duration::ZERO, ..Self::default() }
    }
}

/// Run `op`, retrying retryable failures with exponential backoff.
///
/// Non-retryable errors propagate immediately without sleeping. Once the
/// attempt budget is exhausted, the last error is returned. Backoff sleeps
/// block the invocation; no other stage of the same request proceeds during
/// a sleep.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                let sleep_for = delay.min(policy.max_delay);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = policy.max_retries + 1,
                    delay_ms = sleep_for.as_millis() as u64,
                    error = %e,
                    "provider call failed, retrying"
                );
                tokio::time::sleep(sleep_for).await;
                delay = delay.mul_f64(policy.exponential_base);
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    error!(
                        operation,
                        attempts = attempt + 1,
                        error = %e,
                        "provider call failed after exhausting retries"
                    );
                }
                return Err(e);
            }
        }
    }
}
