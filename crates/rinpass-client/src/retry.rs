//! Backoff for transient gate failures
//!
//! Only issuance goes through [`with_retry`], and only errors that
//! [`ClientError::is_retryable`] reports as transient are tried again: source
//! outages, timeouts and dropped connections. A denial or a misconfigured
//! gate comes back from the first attempt.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{ClientError, Result};

/// Backoff schedule for issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub retries: u32,
    /// Delay before the first retry; doubled for each one after
    pub base_delay: Duration,
    /// Ceiling for a single delay, before jitter
    pub max_delay: Duration,
    /// Add up to a quarter of the delay at random
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A schedule that makes exactly one attempt
    #[must_use]
    pub fn disabled() -> Self {
        Self::default().with_retries(0)
    }

    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `retry` (zero-based)
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);

        if self.jitter {
            delay + spread(delay / 4)
        } else {
            delay
        }
    }
}

/// Pseudo-random duration below `range`, seeded from the wall clock
fn spread(range: Duration) -> Duration {
    let range_nanos = u64::try_from(range.as_nanos()).unwrap_or(u64::MAX);
    if range_nanos == 0 {
        return Duration::ZERO;
    }
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    Duration::from_nanos(u64::from(seed) % range_nanos)
}

/// Run a gate call, retrying transient failures on `config`'s schedule
///
/// The last error is returned once the retries are spent.
pub async fn with_retry<F, Fut, T>(config: RetryConfig, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retry = 0;

    loop {
        let err: ClientError = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_retryable() || retry >= config.retries {
            return Err(err);
        }

        let delay = config.delay_for_retry(retry);
        retry += 1;
        tracing::warn!(
            retry,
            retries = config.retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Gate call failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
