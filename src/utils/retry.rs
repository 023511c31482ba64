// =============================================================================
// utils/retry.rs
// =============================================================================
// fetch_with_policy - per-attempt timeout + optional exponential backoff with
// full jitter. Every upstream provider call goes through here.
// =============================================================================

use anyhow::{anyhow, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Timeout and retry policy for upstream calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    /// Timeout per attempt (ms)
    pub timeout_ms: u64,
    /// Attempts including the first; 1 disables retries
    pub max_attempts: usize,
    /// Base backoff (ms)
    pub backoff_base_ms: u64,
    /// Backoff cap (ms)
    pub backoff_max_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            max_attempts: 1,
            backoff_base_ms: 50,
            backoff_max_ms: 5_000,
        }
    }
}

impl FetchPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full-jitter backoff: random(0, min(max, base * 2^(attempt-1)))
    fn backoff_with_jitter(&self, attempt: usize) -> u64 {
        let exp_backoff = self
            .backoff_base_ms
            .saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1) as u32));
        let capped = exp_backoff.min(self.backoff_max_ms);
        rand::thread_rng().gen_range(0..=capped)
    }
}

/// Run `op` under `policy`. `label` names the call in logs and errors.
///
/// # Example
/// ```no_run
/// use launch_risk_oracle::utils::retry::{fetch_with_policy, FetchPolicy};
///
/// async fn example() -> anyhow::Result<u64> {
///     fetch_with_policy(&FetchPolicy::default(), "get_slot", || async { Ok(42) }).await
/// }
/// ```
pub async fn fetch_with_policy<F, Fut, T>(policy: &FetchPolicy, label: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match timeout(policy.timeout(), op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => anyhow!("{} timed out after {}ms", label, policy.timeout_ms),
        };

        if attempt >= max_attempts {
            return Err(error.context(format!("{} failed after {} attempt(s)", label, attempt)));
        }

        let backoff_ms = policy.backoff_with_jitter(attempt);
        debug!(
            "{} failed (attempt {}/{}): {}. Retrying in {}ms...",
            label, attempt, max_attempts, error, backoff_ms
        );
        sleep(Duration::from_millis(backoff_ms)).await;
    }
}
