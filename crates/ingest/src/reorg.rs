//! Detection of stale confirmed blocks after a chain reorganization.

use crate::{ChainClient, IngestOutcome, IngestStorage, IngestWorker, metrics::Metrics};
use std::sync::Arc;
use trawler_storage::StorageError;
use trawler_types::BlockRecord;

/// Walks back from a newly inserted block and replaces stored ancestors that no longer link to
/// it.
///
/// A stored block `n - 1` whose hash differs from the parent hash of the stored block `n` was
/// replaced on chain. It is invalidated (`Confirmed` to `Dirty`) and re-ingested, after which
/// the walk continues with `n - 2`.
#[derive(Debug)]
pub struct ReorgDetector<C, S> {
    worker: Arc<IngestWorker<C, S>>,
    max_depth: u64,
}

impl<C, S> Clone for ReorgDetector<C, S> {
    fn clone(&self) -> Self {
        Self { worker: Arc::clone(&self.worker), max_depth: self.max_depth }
    }
}

impl<C, S> ReorgDetector<C, S>
where
    C: ChainClient,
    S: IngestStorage,
{
    /// Creates a detector walking back at most `max_depth` ancestors.
    pub const fn new(worker: Arc<IngestWorker<C, S>>, max_depth: u64) -> Self {
        Self { worker, max_depth }
    }

    /// Checks the ancestry of the stored block `number`.
    ///
    /// Stops at the first ancestor that links correctly, at an ancestor that is not stored,
    /// at genesis, or after `max_depth` ancestors. Returns the number of replaced blocks.
    pub async fn check(&self, number: u64) -> u64 {
        let mut child = number;
        let mut replaced = 0;

        for _ in 0..self.max_depth {
            let Some(parent) = child.checked_sub(1) else { break };

            let (child_block, parent_block) = match self.pair(child, parent) {
                Ok(Some(pair)) => pair,
                Ok(None) => break,
                Err(err) => {
                    warn!(
                        target: "ingest::reorg",
                        number = child,
                        %err,
                        "Failed to read ancestry"
                    );
                    break;
                }
            };
            if parent_block.hash == child_block.parent_hash {
                break;
            }

            warn!(
                target: "ingest::reorg",
                number = parent,
                stored_hash = %parent_block.hash,
                expected_hash = %child_block.parent_hash,
                "Stored block is no longer canonical"
            );

            match self.worker.tracker().invalidate(parent) {
                Ok(true) => Metrics::record_invalidation(),
                Ok(false) => {
                    debug!(
                        target: "ingest::reorg",
                        number = parent,
                        "Block not confirmed, not invalidating"
                    );
                    break;
                }
                Err(err) => {
                    warn!(
                        target: "ingest::reorg",
                        number = parent,
                        %err,
                        "Failed to invalidate block"
                    );
                    break;
                }
            }

            let outcome = self.worker.ingest(parent).await;
            if outcome != IngestOutcome::Inserted {
                warn!(
                    target: "ingest::reorg",
                    number = parent,
                    %outcome,
                    "Failed to replace stale block, it stays dirty"
                );
                break;
            }
            replaced += 1;
            child = parent;
        }

        if replaced > 0 {
            info!(target: "ingest::reorg", number, replaced, "Replaced reorganized blocks");
        }
        replaced
    }

    fn pair(
        &self,
        child: u64,
        parent: u64,
    ) -> Result<Option<(BlockRecord, BlockRecord)>, StorageError> {
        let storage = self.worker.storage();
        let Some(child_block) = storage.get_block(child)? else { return Ok(None) };
        let Some(parent_block) = storage.get_block(parent)? else { return Ok(None) };
        Ok(Some((child_block, parent_block)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        BlockLocks,
        test_utils::{FakeChain, InMemoryStorage, fast_retry},
    };
    use trawler_types::BlockState;

    type Setup = (Arc<FakeChain>, Arc<InMemoryStorage>, ReorgDetector<FakeChain, InMemoryStorage>);

    async fn setup(head: u64, max_depth: u64) -> Setup {
        let chain = Arc::new(FakeChain::linear(head, 0));
        let storage = Arc::new(InMemoryStorage::default());
        let locks = BlockLocks::new();
        let worker = IngestWorker::new(Arc::clone(&chain), Arc::clone(&storage), locks, fast_retry());
        let worker = Arc::new(worker);
        for number in 0..=head {
            assert_eq!(worker.ingest(number).await, IngestOutcome::Inserted);
        }
        (chain, storage, ReorgDetector::new(worker, max_depth))
    }

    #[tokio::test]
    async fn test_canonical_ancestry_is_left_alone() {
        let (_chain, storage, detector) = setup(10, 64).await;
        storage.clear_calls();

        assert_eq!(detector.check(10).await, 0);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stale_ancestors_are_replaced() {
        let (chain, storage, detector) = setup(10, 64).await;

        // Blocks 7.. move to another fork; the follower then re-ingests 10.
        chain.reorg(7, 1);
        let worker = Arc::clone(&detector.worker);
        worker.tracker().invalidate(10).unwrap();
        assert_eq!(worker.ingest(10).await, IngestOutcome::Inserted);

        assert_eq!(detector.check(10).await, 3);
        for number in 7..=10 {
            let stored = storage.get_block(number).unwrap().unwrap();
            assert_eq!(Some(stored), chain.bundle(number).map(|bundle| bundle.block));
            assert_eq!(storage.state(number), Some(BlockState::Confirmed));
        }
        // Block 6 was never replaced.
        let six = storage.get_block(6).unwrap().unwrap();
        assert_eq!(storage.get_block(7).unwrap().unwrap().parent_hash, six.hash);
    }

    #[tokio::test]
    async fn test_walk_is_bounded_by_max_depth() {
        let (chain, storage, detector) = setup(10, 2).await;

        chain.reorg(5, 1);
        let worker = Arc::clone(&detector.worker);
        worker.tracker().invalidate(10).unwrap();
        worker.ingest(10).await;

        assert_eq!(detector.check(10).await, 2);
        assert_eq!(storage.get_block(8).unwrap(), chain.bundle(8).map(|bundle| bundle.block));
        assert_ne!(storage.get_block(7).unwrap(), chain.bundle(7).map(|bundle| bundle.block));
    }

    #[tokio::test]
    async fn test_missing_ancestor_stops_the_walk() {
        let (chain, storage, detector) = setup(3, 64).await;
        chain.advance(6, 0);
        detector.worker.ingest(6).await;

        assert_eq!(detector.check(6).await, 0);
        assert_eq!(storage.get_block(5).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_replacement_leaves_block_dirty() {
        let (chain, storage, detector) = setup(5, 64).await;

        chain.reorg(4, 1);
        let worker = Arc::clone(&detector.worker);
        worker.tracker().invalidate(5).unwrap();
        worker.ingest(5).await;
        chain.fail_block(4);

        assert_eq!(detector.check(5).await, 0);
        assert_eq!(storage.state(4), Some(BlockState::Dirty));
    }
}
