use crate::{BlockLocks, BlockStateTracker, IngestStorage, metrics::Metrics};
use std::sync::Arc;
use thiserror::Error;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use trawler_storage::StorageError;
use trawler_types::BlockState;

/// An error that stopped a backfill pass early.
#[derive(Debug, Error)]
pub enum BackfillError {
    /// The consumer side of the queue was dropped.
    #[error("Backfill queue closed while enqueueing block {0}")]
    QueueClosed(u64),
}

/// Counters for a finished backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Block numbers visited.
    pub visited: u64,
    /// Block numbers skipped because they were already confirmed.
    pub skipped: u64,
    /// Block numbers handed to the consumer.
    pub enqueued: u64,
    /// Dirty block numbers whose stale data was removed before enqueueing.
    pub reconciled: u64,
}

/// What a single scanner step decided for a block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Skip,
    Enqueue { reconciled: bool },
}

/// Walks block numbers from a start height down to genesis and enqueues every number that is
/// not confirmed.
///
/// The pass runs once. Enqueueing waits while the queue is full, and the queue is closed when
/// the scanner finishes, which lets the [`crate::BackfillConsumer`] exit once it has drained it.
#[derive(Debug)]
pub struct BackfillScanner<S> {
    storage: Arc<S>,
    tracker: BlockStateTracker<S>,
    locks: BlockLocks,
    start: u64,
    queue: mpsc::Sender<u64>,
    cancellation: CancellationToken,
}

impl<S: IngestStorage> BackfillScanner<S> {
    /// Creates a new [`BackfillScanner`] starting at `start`.
    pub fn new(
        storage: Arc<S>,
        locks: BlockLocks,
        start: u64,
        queue: mpsc::Sender<u64>,
        cancellation: CancellationToken,
    ) -> Self {
        let tracker = BlockStateTracker::new(Arc::clone(&storage));
        Self { storage, tracker, locks, start, queue, cancellation }
    }

    /// Runs the pass to completion, shutdown, or until the consumer goes away.
    pub async fn run(self) -> Result<BackfillSummary, BackfillError> {
        info!(target: "ingest::backfill", start = self.start, "Starting backfill");
        let mut summary = BackfillSummary::default();
        let mut cursor = Some(self.start);

        while let Some(number) = cursor {
            if self.cancellation.is_cancelled() {
                info!(target: "ingest::backfill", number, "Backfill cancelled");
                return Ok(summary);
            }
            Metrics::set_backfill_cursor(number);
            summary.visited += 1;

            match self.step(number).await {
                Step::Skip => summary.skipped += 1,
                Step::Enqueue { reconciled } => {
                    summary.reconciled += u64::from(reconciled);
                    select! {
                        biased;
                        _ = self.cancellation.cancelled() => {
                            info!(target: "ingest::backfill", number, "Backfill cancelled");
                            return Ok(summary);
                        }
                        sent = self.queue.send(number) => {
                            sent.map_err(|_| BackfillError::QueueClosed(number))?;
                            summary.enqueued += 1;
                        }
                    }
                }
            }

            cursor = number.checked_sub(1);
        }

        info!(
            target: "ingest::backfill",
            visited = summary.visited,
            skipped = summary.skipped,
            enqueued = summary.enqueued,
            reconciled = summary.reconciled,
            "Backfill reached genesis"
        );
        Ok(summary)
    }

    /// Decides what to do with `number` while holding its lock.
    ///
    /// Storage failures never stop the pass: the number is enqueued and the worker re-checks
    /// its state.
    async fn step(&self, number: u64) -> Step {
        let _guard = self.locks.lock(number).await;

        match self.tracker.get(number) {
            Ok(Some(BlockState::Confirmed)) => {
                trace!(target: "ingest::backfill", number, "Skipping confirmed block");
                Step::Skip
            }
            Ok(Some(BlockState::Dirty)) => match self.reconcile(number) {
                Ok(()) => Step::Enqueue { reconciled: true },
                Err(err) => {
                    warn!(
                        target: "ingest::backfill",
                        number,
                        %err,
                        "Failed to reconcile dirty block, leaving it to the worker"
                    );
                    Step::Enqueue { reconciled: false }
                }
            },
            Ok(Some(BlockState::Pending)) => Step::Enqueue { reconciled: false },
            Ok(None) => {
                if let Err(err) = self.tracker.create(number) {
                    warn!(target: "ingest::backfill", number, %err, "Failed to create block state");
                }
                Step::Enqueue { reconciled: false }
            }
            Err(err) => {
                warn!(target: "ingest::backfill", number, %err, "Failed to read block state");
                Step::Enqueue { reconciled: false }
            }
        }
    }

    fn reconcile(&self, number: u64) -> Result<(), StorageError> {
        let deletion = self.storage.delete_block(number)?;
        self.tracker.transition(number, Some(BlockState::Dirty), BlockState::Pending)?;
        info!(
            target: "ingest::backfill",
            number,
            receipts = deletion.receipts,
            logs = deletion.logs,
            "Reconciled dirty block"
        );
        Ok(())
    }
}
