//! Wiring of the pipeline tasks.

use crate::{
    BACKFILL_QUEUE_CAPACITY, BackfillConsumer, BackfillScanner, BlockLocks, ChainClient,
    ChainClientError, HeadFollower, IngestConfig, IngestStorage, IngestWorker, ReorgDetector,
    frontier, metrics::Metrics,
};
use backon::Retryable;
use std::sync::Arc;
use thiserror::Error;
use tokio::{select, sync::mpsc, task::JoinError};
use tokio_util::sync::CancellationToken;

/// An error that stopped the [`IngestService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The chain head could not be determined at startup.
    #[error("Failed to query chain head at startup: {0}")]
    Head(#[from] ChainClientError),
    /// A pipeline task panicked.
    #[error("Pipeline task failed: {0}")]
    Task(#[from] JoinError),
}

/// Runs the backfill scanner, the backfill consumer and the head follower against one chain
/// and one store.
///
/// The backfill covers everything from its start height down to genesis, the head follower
/// everything above `frontier(head at startup) - 1`.
#[derive(Debug)]
pub struct IngestService<C, S> {
    client: Arc<C>,
    storage: Arc<S>,
    config: IngestConfig,
    cancellation: CancellationToken,
}

impl<C, S> IngestService<C, S>
where
    C: ChainClient + 'static,
    S: IngestStorage,
{
    /// Creates a new [`IngestService`].
    pub const fn new(
        client: Arc<C>,
        storage: Arc<S>,
        config: IngestConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self { client, storage, config, cancellation }
    }

    /// Runs the pipeline until the cancellation token fires or the head follower stops.
    ///
    /// A finished backfill does not stop the service.
    pub async fn run(self) -> Result<(), ServiceError> {
        Metrics::init();
        let Self { client, storage, config, cancellation } = self;

        let head = (|| async { client.head_number().await })
            .retry(config.retry.backoff())
            .when(ChainClientError::is_transient)
            .await?;
        let boundary = frontier(head, config.reorg_margin)
            .and_then(|frontier| frontier.checked_sub(1))
            .unwrap_or_default();
        let start = config.backfill_start.unwrap_or(boundary);
        info!(
            target: "ingest::service",
            head,
            backfill_start = start,
            follow_from = boundary + 1,
            "Starting ingestion"
        );

        let locks = BlockLocks::new();
        let worker = Arc::new(IngestWorker::new(
            Arc::clone(&client),
            Arc::clone(&storage),
            locks.clone(),
            config.retry,
        ));

        let (queue_tx, queue_rx) = mpsc::channel(BACKFILL_QUEUE_CAPACITY);
        let scanner = BackfillScanner::new(storage, locks, start, queue_tx, cancellation.clone());
        let consumer = BackfillConsumer::new(Arc::clone(&worker), queue_rx, cancellation.clone());
        let reorg = ReorgDetector::new(Arc::clone(&worker), config.reorg_max_depth);
        let follower =
            HeadFollower::new(client, worker, reorg, config.reorg_margin, cancellation.clone())
                .with_poll_interval(config.poll_interval)
                .with_max_catchup(config.max_catchup)
                .with_retry(config.retry)
                .with_last_followed(boundary);

        let scanner = tokio::spawn(scanner.run());
        let consumer = tokio::spawn(consumer.run());
        let mut follower = tokio::spawn(follower.run());

        let follower_result = select! {
            _ = cancellation.cancelled() => None,
            result = &mut follower => {
                warn!(target: "ingest::service", "Head follower stopped, shutting down");
                Some(result)
            }
        };
        cancellation.cancel();

        match scanner.await? {
            Ok(summary) => {
                debug!(target: "ingest::service", ?summary, "Backfill scanner stopped");
            }
            Err(err) => warn!(target: "ingest::service", %err, "Backfill scanner stopped early"),
        }
        let summary = consumer.await?;
        debug!(target: "ingest::service", ?summary, "Backfill consumer stopped");
        match follower_result {
            Some(result) => result?,
            None => follower.await?,
        }

        info!(target: "ingest::service", "Ingestion stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeChain, InMemoryStorage, fast_retry};
    use std::time::Duration;
    use trawler_types::BlockState;

    fn config() -> IngestConfig {
        IngestConfig {
            poll_interval: Duration::from_millis(5),
            retry: fast_retry(),
            ..Default::default()
        }
    }

    async fn wait_for(storage: &InMemoryStorage, numbers: impl Iterator<Item = u64> + Clone) {
        let confirmed = || {
            numbers.clone().all(|number| storage.state(number) == Some(BlockState::Confirmed))
        };
        tokio::time::timeout(Duration::from_secs(5), async {
            while !confirmed() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("blocks were not confirmed in time");
    }

    #[tokio::test]
    async fn test_backfill_and_follow_cover_the_chain() {
        let chain = Arc::new(FakeChain::linear(150, 0));
        let storage = Arc::new(InMemoryStorage::default());
        let cancellation = CancellationToken::new();
        let service = IngestService::new(
            Arc::clone(&chain),
            Arc::clone(&storage),
            config(),
            cancellation.clone(),
        );
        let handle = tokio::spawn(service.run());

        wait_for(&storage, 0..=142).await;
        chain.advance(160, 0);
        wait_for(&storage, 143..=152).await;

        cancellation.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(storage.state(153), None);
        assert_eq!(storage.receipt_count(), 153 * 2);
    }

    #[tokio::test]
    async fn test_backfill_start_override() {
        let chain = Arc::new(FakeChain::linear(40, 0));
        let storage = Arc::new(InMemoryStorage::default());
        let cancellation = CancellationToken::new();
        let config = IngestConfig { backfill_start: Some(10), ..config() };
        let service = IngestService::new(
            Arc::clone(&chain),
            Arc::clone(&storage),
            config,
            cancellation.clone(),
        );
        let handle = tokio::spawn(service.run());

        wait_for(&storage, (0..=10).chain(32..=32)).await;
        cancellation.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(storage.state(11), None);
        assert_eq!(storage.state(31), None);
    }

    #[tokio::test]
    async fn test_unreachable_chain_fails_startup() {
        let chain = Arc::new(FakeChain::linear(40, 0));
        chain.fail_head(usize::MAX);
        let storage = Arc::new(InMemoryStorage::default());
        let service = IngestService::new(chain, storage, config(), CancellationToken::new());

        let err = service.run().await.unwrap_err();
        assert!(matches!(err, ServiceError::Head(_)));
    }
}
