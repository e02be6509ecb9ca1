//! The ingestion routine.

use crate::{
    BlockLocks, BlockStateTracker, ChainClient, ChainClientError, IngestStorage, RetryConfig,
    metrics::Metrics,
};
use alloy_eips::BlockNumberOrTag;
use backon::Retryable;
use derive_more::Display;
use std::sync::Arc;
use thiserror::Error;
use trawler_storage::StorageError;
use trawler_types::{BlockBundle, BlockState};

/// The result of [`IngestWorker::ingest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum IngestOutcome {
    /// Block, receipts and logs were persisted and the block is now confirmed.
    #[display("inserted")]
    Inserted,
    /// The block was already confirmed; nothing was written.
    #[display("already_confirmed")]
    AlreadyConfirmed,
    /// The block could not be ingested. Its state is absent or pending.
    #[display("failed")]
    Failed,
}

impl IngestOutcome {
    /// Returns the outcome as a metric label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::AlreadyConfirmed => "already_confirmed",
            Self::Failed => "failed",
        }
    }
}

/// An error that made an ingestion attempt fail.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The block could not be fetched.
    #[error("Chain error: {0}")]
    Chain(#[from] ChainClientError),
    /// The block could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Fetches blocks and persists them, advancing their state to [`BlockState::Confirmed`].
///
/// The worker is the only component that writes block, receipt and log data. It is safe to call
/// [`IngestWorker::ingest`] concurrently: calls for the same number are serialized through
/// [`BlockLocks`].
#[derive(Debug)]
pub struct IngestWorker<C, S> {
    client: Arc<C>,
    storage: Arc<S>,
    tracker: BlockStateTracker<S>,
    locks: BlockLocks,
    retry: RetryConfig,
}

impl<C, S> IngestWorker<C, S>
where
    C: ChainClient,
    S: IngestStorage,
{
    /// Creates a new [`IngestWorker`].
    pub fn new(client: Arc<C>, storage: Arc<S>, locks: BlockLocks, retry: RetryConfig) -> Self {
        let tracker = BlockStateTracker::new(Arc::clone(&storage));
        Self { client, storage, tracker, locks, retry }
    }

    /// The state tracker over the worker's storage.
    pub const fn tracker(&self) -> &BlockStateTracker<S> {
        &self.tracker
    }

    /// The lock registry shared with the backfill scanner.
    pub const fn locks(&self) -> &BlockLocks {
        &self.locks
    }

    /// The storage the worker writes to.
    pub const fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Ingests block `number`.
    ///
    /// 1. Fetches the block, its receipts and logs. Nothing is written if this fails.
    /// 2. Under the number's lock: returns [`IngestOutcome::AlreadyConfirmed`] for a confirmed
    ///    block, deletes stale data of a dirty block or leftover rows of a pending one, creates
    ///    a pending record for an unknown block.
    /// 3. Persists the block, then its receipts, then its logs, and marks it confirmed.
    ///
    /// Fetching and persisting are each retried with the configured backoff. Errors never
    /// escape: they are logged and reported as [`IngestOutcome::Failed`].
    pub async fn ingest(&self, number: u64) -> IngestOutcome {
        let outcome = match self.try_ingest(number).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(target: "ingest::worker", number, %err, "Failed to ingest block");
                IngestOutcome::Failed
            }
        };
        match outcome {
            IngestOutcome::Inserted => {
                info!(target: "ingest::worker", number, "Inserted block");
            }
            IngestOutcome::AlreadyConfirmed => {
                debug!(target: "ingest::worker", number, "Block already confirmed");
            }
            IngestOutcome::Failed => {}
        }
        Metrics::record_outcome(outcome);
        outcome
    }

    async fn try_ingest(&self, number: u64) -> Result<IngestOutcome, IngestError> {
        let bundle = self.fetch(number).await?;

        let _guard = self.locks.lock(number).await;
        let outcome = (|| async { self.persist(number, &bundle) })
            .retry(self.retry.backoff())
            .notify(|err, delay| {
                debug!(
                    target: "ingest::worker",
                    number,
                    %err,
                    ?delay,
                    "Retrying block persistence"
                );
            })
            .await?;
        Ok(outcome)
    }

    async fn fetch(&self, number: u64) -> Result<BlockBundle, ChainClientError> {
        (|| async { self.client.fetch_block(BlockNumberOrTag::Number(number)).await })
            .retry(self.retry.backoff())
            .when(ChainClientError::is_transient)
            .notify(|err, delay| {
                debug!(target: "ingest::worker", number, %err, ?delay, "Retrying block fetch");
            })
            .await
    }

    /// Runs the read-decide-write sequence for a fetched block. Must be called under the lock.
    fn persist(&self, number: u64, bundle: &BlockBundle) -> Result<IngestOutcome, StorageError> {
        match self.tracker.get(number)? {
            Some(BlockState::Confirmed) => return Ok(IngestOutcome::AlreadyConfirmed),
            Some(BlockState::Dirty) => {
                let deletion = self.storage.delete_block(number)?;
                info!(
                    target: "ingest::worker",
                    number,
                    receipts = deletion.receipts,
                    logs = deletion.logs,
                    "Reconciled dirty block"
                );
            }
            Some(BlockState::Pending) => {
                // An interrupted pass may have left rows of another fork behind.
                if !matches!(self.storage.get_block(number), Ok(None)) {
                    let deletion = self.storage.delete_block(number)?;
                    info!(
                        target: "ingest::worker",
                        number,
                        receipts = deletion.receipts,
                        logs = deletion.logs,
                        "Removed leftover rows of pending block"
                    );
                }
            }
            None => {
                self.tracker.create(number)?;
            }
        }

        if let Err(err) = self.write(number, bundle) {
            // Leave no partial data behind; the record stays pending or dirty for the retry.
            if let Err(cleanup) = self.storage.delete_block(number) {
                error!(
                    target: "ingest::worker",
                    number,
                    %cleanup,
                    "Failed to remove partially written block"
                );
            }
            return Err(err);
        }

        self.tracker.set_state(number, BlockState::Confirmed)?;
        Ok(IngestOutcome::Inserted)
    }

    fn write(&self, number: u64, bundle: &BlockBundle) -> Result<(), StorageError> {
        self.storage.insert_block(&bundle.block)?;
        self.storage.insert_receipts(number, &bundle.receipts)?;
        self.storage.insert_logs(number, &bundle.logs)?;
        Ok(())
    }
}
