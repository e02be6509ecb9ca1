//! Live head following.

use crate::{
    ChainClient, ChainClientError, IngestOutcome, IngestStorage, IngestWorker, MIN_POLL_INTERVAL,
    ReorgDetector, RetryConfig, frontier, metrics::Metrics,
};
use backon::Retryable;
use std::{sync::Arc, time::Duration};
use tokio::{
    select,
    time::{MissedTickBehavior, interval},
};
use tokio_util::sync::CancellationToken;

/// Periodically polls the chain head and ingests every block up to `head - margin`.
///
/// Each tick ingests the numbers between the last followed block and the current frontier in
/// ascending order, at most `max_catchup` of them. A failed number stops the tick and is
/// retried first on the next one. Every inserted block has its ancestry checked by the
/// [`ReorgDetector`].
#[derive(Debug)]
pub struct HeadFollower<C, S> {
    client: Arc<C>,
    worker: Arc<IngestWorker<C, S>>,
    reorg: ReorgDetector<C, S>,
    margin: u64,
    max_catchup: u64,
    poll_interval: Duration,
    retry: RetryConfig,
    /// The highest number followed so far.
    last: Option<u64>,
    cancellation: CancellationToken,
}

impl<C, S> HeadFollower<C, S>
where
    C: ChainClient,
    S: IngestStorage,
{
    /// Creates a new [`HeadFollower`].
    ///
    /// # Arguments
    ///
    /// * `client` - The chain to poll for its head
    /// * `worker` - The worker ingesting followed blocks
    /// * `reorg` - The detector run after each inserted block
    /// * `margin` - Number of blocks to stay behind the head
    /// * `cancellation` - Cancellation token for graceful shutdown
    pub fn new(
        client: Arc<C>,
        worker: Arc<IngestWorker<C, S>>,
        reorg: ReorgDetector<C, S>,
        margin: u64,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            client,
            worker,
            reorg,
            margin,
            max_catchup: crate::DEFAULT_MAX_CATCHUP,
            poll_interval: crate::DEFAULT_POLL_INTERVAL,
            retry: RetryConfig::default(),
            last: None,
            cancellation,
        }
    }

    /// Sets the polling interval. Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Sets the maximum number of blocks ingested per tick. Zero is treated as one.
    pub fn with_max_catchup(mut self, max_catchup: u64) -> Self {
        self.max_catchup = max_catchup.max(1);
        self
    }

    /// Sets the backoff policy for head queries.
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Marks `number` as already followed, so the first tick continues from `number + 1`.
    pub const fn with_last_followed(mut self, number: u64) -> Self {
        self.last = Some(number);
        self
    }

    /// Runs the polling loop until cancelled.
    pub async fn run(mut self) {
        let cancel = self.cancellation.clone();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            target: "ingest::head",
            interval_ms = self.poll_interval.as_millis() as u64,
            margin = self.margin,
            "Starting head follower"
        );

        loop {
            select! {
                _ = cancel.cancelled() => {
                    info!(
                        target: "ingest::head",
                        "Received shutdown signal. Exiting head follower task."
                    );
                    return;
                }
                _ = ticker.tick() => self.tick().await,
            }
        }
    }

    /// Runs a single polling round.
    pub(crate) async fn tick(&mut self) {
        let head = match self.head().await {
            Ok(head) => head,
            Err(err) => {
                warn!(
                    target: "ingest::head",
                    %err,
                    "Failed to query chain head, will retry on next interval"
                );
                return;
            }
        };

        let Some(frontier) = frontier(head, self.margin) else {
            debug!(
                target: "ingest::head",
                head,
                margin = self.margin,
                "Chain shorter than margin"
            );
            return;
        };
        Metrics::set_head_frontier(frontier);

        let first = match self.last {
            Some(last) if last >= frontier => {
                trace!(target: "ingest::head", head, frontier, "Frontier unchanged");
                return;
            }
            Some(last) => last + 1,
            None => frontier,
        };
        let end = frontier.min(first.saturating_add(self.max_catchup - 1));
        if end < frontier {
            debug!(
                target: "ingest::head",
                first,
                end,
                frontier,
                "Catching up with the frontier"
            );
        }

        for number in first..=end {
            match self.worker.ingest(number).await {
                IngestOutcome::Inserted => {
                    self.last = Some(number);
                    self.reorg.check(number).await;
                }
                IngestOutcome::AlreadyConfirmed => self.last = Some(number),
                IngestOutcome::Failed => break,
            }
        }
    }

    async fn head(&self) -> Result<u64, ChainClientError> {
        (|| async { self.client.head_number().await })
            .retry(self.retry.backoff())
            .when(ChainClientError::is_transient)
            .notify(|err, delay| {
                debug!(target: "ingest::head", %err, ?delay, "Retrying head query");
            })
            .await
    }
}
