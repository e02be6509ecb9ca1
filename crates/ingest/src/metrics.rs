//! Metrics for the ingestion pipeline.

use crate::IngestOutcome;

/// Container for the metric names and helpers used by the pipeline.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Identifier for the counter of ingestion outcomes, labeled by `outcome`.
    pub const INGEST_TOTAL: &'static str = "trawler_ingest_total";
    /// Identifier for the counter of blocks invalidated by reorg detection.
    pub const REORG_INVALIDATIONS_TOTAL: &'static str = "trawler_reorg_invalidations_total";
    /// Identifier for the gauge tracking the block number the backfill is visiting.
    pub const BACKFILL_CURSOR: &'static str = "trawler_backfill_cursor";
    /// Identifier for the gauge tracking the head follower's frontier.
    pub const HEAD_FRONTIER: &'static str = "trawler_head_frontier";

    /// Initializes metrics for the pipeline.
    ///
    /// This does two things:
    /// * Describes the metrics.
    /// * Initializes them to zero so they show up in the exporter before the first event.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::INGEST_TOTAL,
            metrics::Unit::Count,
            "Number of ingestion attempts by outcome",
        );
        metrics::describe_counter!(
            Self::REORG_INVALIDATIONS_TOTAL,
            metrics::Unit::Count,
            "Number of confirmed blocks invalidated after a parent hash mismatch",
        );
        metrics::describe_gauge!(
            Self::BACKFILL_CURSOR,
            "Block number most recently visited by the backfill scanner",
        );
        metrics::describe_gauge!(Self::HEAD_FRONTIER, "Highest block number the follower may ingest");
    }

    fn zero() {
        for outcome in
            [IngestOutcome::Inserted, IngestOutcome::AlreadyConfirmed, IngestOutcome::Failed]
        {
            metrics::counter!(Self::INGEST_TOTAL, "outcome" => outcome.as_str()).increment(0);
        }
        metrics::counter!(Self::REORG_INVALIDATIONS_TOTAL).increment(0);
        metrics::gauge!(Self::BACKFILL_CURSOR).set(0.0);
        metrics::gauge!(Self::HEAD_FRONTIER).set(0.0);
    }

    pub(crate) fn record_outcome(outcome: IngestOutcome) {
        metrics::counter!(Self::INGEST_TOTAL, "outcome" => outcome.as_str()).increment(1);
    }

    pub(crate) fn record_invalidation() {
        metrics::counter!(Self::REORG_INVALIDATIONS_TOTAL).increment(1);
    }

    pub(crate) fn set_backfill_cursor(number: u64) {
        metrics::gauge!(Self::BACKFILL_CURSOR).set(number as f64);
    }

    pub(crate) fn set_head_frontier(number: u64) {
        metrics::gauge!(Self::HEAD_FRONTIER).set(number as f64);
    }
}
