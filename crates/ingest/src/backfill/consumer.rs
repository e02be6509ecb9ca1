use crate::{ChainClient, IngestOutcome, IngestStorage, IngestWorker};
use std::sync::Arc;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;

/// Outcome counts of a finished [`BackfillConsumer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerSummary {
    /// Blocks newly inserted.
    pub inserted: u64,
    /// Blocks found already confirmed.
    pub already_confirmed: u64,
    /// Blocks that failed and were left for a later pass.
    pub failed: u64,
}

impl ConsumerSummary {
    fn record(&mut self, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Inserted => self.inserted += 1,
            IngestOutcome::AlreadyConfirmed => self.already_confirmed += 1,
            IngestOutcome::Failed => self.failed += 1,
        }
    }
}

/// Drains the backfill queue, ingesting every number it receives.
///
/// Exits once the queue is closed and empty, or on shutdown.
#[derive(Debug)]
pub struct BackfillConsumer<C, S> {
    worker: Arc<IngestWorker<C, S>>,
    queue: mpsc::Receiver<u64>,
    cancellation: CancellationToken,
}

impl<C, S> BackfillConsumer<C, S>
where
    C: ChainClient,
    S: IngestStorage,
{
    /// Creates a new [`BackfillConsumer`].
    pub const fn new(
        worker: Arc<IngestWorker<C, S>>,
        queue: mpsc::Receiver<u64>,
        cancellation: CancellationToken,
    ) -> Self {
        Self { worker, queue, cancellation }
    }

    /// Runs until the queue is closed and drained.
    pub async fn run(mut self) -> ConsumerSummary {
        let mut summary = ConsumerSummary::default();
        loop {
            select! {
                biased;
                _ = self.cancellation.cancelled() => {
                    info!(
                        target: "ingest::backfill",
                        "Received shutdown signal. Exiting backfill consumer."
                    );
                    break;
                }
                next = self.queue.recv() => {
                    let Some(number) = next else {
                        info!(
                            target: "ingest::backfill",
                            inserted = summary.inserted,
                            already_confirmed = summary.already_confirmed,
                            failed = summary.failed,
                            "Backfill queue drained"
                        );
                        break;
                    };
                    summary.record(self.worker.ingest(number).await);
                }
            }
        }
        summary
    }
}
