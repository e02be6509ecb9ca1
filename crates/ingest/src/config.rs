//! Pipeline configuration.

use crate::RetryConfig;
use std::time::Duration;

/// Capacity of the queue between the backfill scanner and its consumer.
pub const BACKFILL_QUEUE_CAPACITY: usize = 100;

/// Default number of blocks behind the head considered final.
pub const DEFAULT_REORG_MARGIN: u64 = 8;

/// Default bound on the ancestry walk performed after each newly followed block.
pub const DEFAULT_REORG_MAX_DEPTH: u64 = 64;

/// Default head follower tick.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shortest head follower tick. `tokio::time::interval` rejects a zero period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default number of blocks the head follower ingests in a single tick.
pub const DEFAULT_MAX_CATCHUP: u64 = 32;

/// Returns the highest block number the head follower may ingest for a chain whose head is
/// `head`, or `None` if the chain is shorter than `margin`.
pub const fn frontier(head: u64, margin: u64) -> Option<u64> {
    head.checked_sub(margin)
}

/// Runtime configuration of the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Number of blocks behind the head the follower stays.
    pub reorg_margin: u64,
    /// Maximum number of ancestors the reorg detector walks back.
    pub reorg_max_depth: u64,
    /// Height the backfill starts from. Defaults to one below the frontier at startup.
    pub backfill_start: Option<u64>,
    /// Head follower tick.
    pub poll_interval: Duration,
    /// Maximum number of blocks the head follower ingests per tick.
    pub max_catchup: u64,
    /// Backoff policy for chain and storage calls.
    pub retry: RetryConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            reorg_margin: DEFAULT_REORG_MARGIN,
            reorg_max_depth: DEFAULT_REORG_MAX_DEPTH,
            backfill_start: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_catchup: DEFAULT_MAX_CATCHUP,
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1000, 8, Some(992))]
    #[case(1001, 8, Some(993))]
    #[case(8, 8, Some(0))]
    #[case(7, 8, None)]
    #[case(0, 0, Some(0))]
    fn test_frontier(#[case] head: u64, #[case] margin: u64, #[case] expected: Option<u64>) {
        assert_eq!(frontier(head, margin), expected);
    }
}
