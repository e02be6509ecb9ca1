//! Bounded exponential backoff for chain and storage calls.

use backon::ExponentialBuilder;
use std::time::Duration;

/// Backoff policy applied to every chain and storage call of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_times: usize,
    /// Delay before the first retry.
    pub min_delay: Duration,
    /// Upper bound on the delay between two attempts.
    pub max_delay: Duration,
}

impl RetryConfig {
    /// Default number of retries.
    pub const DEFAULT_MAX_TIMES: usize = 5;
    /// Default delay before the first retry.
    pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(200);
    /// Default delay ceiling.
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

    /// A policy that never retries.
    pub const fn none() -> Self {
        Self { max_times: 0, min_delay: Duration::ZERO, max_delay: Duration::ZERO }
    }

    /// Builds the [`ExponentialBuilder`] for this policy.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_times)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: Self::DEFAULT_MAX_TIMES,
            min_delay: Self::DEFAULT_MIN_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
        }
    }
}
