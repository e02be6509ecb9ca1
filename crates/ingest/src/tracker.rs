//! The per-block tri-state tracker.

use std::{fmt::Debug, sync::Arc};
use trawler_storage::{BlockDataStorage, BlockStateStorage, StorageError};
use trawler_types::BlockState;

/// The storage a pipeline runs against.
pub trait IngestStorage: BlockStateStorage + BlockDataStorage + Debug + Send + Sync + 'static {}

impl<T> IngestStorage for T where
    T: BlockStateStorage + BlockDataStorage + Debug + Send + Sync + 'static
{
}

/// Reads and mutates the [`BlockState`] of block numbers.
///
/// State records that are malformed or partially written read as absent, and [`Self::create`]
/// re-initializes them.
#[derive(Debug)]
pub struct BlockStateTracker<S> {
    storage: Arc<S>,
}

impl<S> Clone for BlockStateTracker<S> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage) }
    }
}

impl<S: BlockStateStorage> BlockStateTracker<S> {
    /// Creates a tracker over `storage`.
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Returns the state of `number`, or `None` if it has no usable record.
    pub fn get(&self, number: u64) -> Result<Option<BlockState>, StorageError> {
        self.storage.block_state(number)
    }

    /// Initializes `number` as [`BlockState::Pending`] if it has no usable record.
    ///
    /// Returns `true` if a record was written.
    pub fn create(&self, number: u64) -> Result<bool, StorageError> {
        let created = self.storage.insert_block_state(number)?;
        if created {
            trace!(target: "ingest::tracker", number, "Created pending block state");
        }
        Ok(created)
    }

    /// Overwrites the state of `number`.
    pub fn set_state(&self, number: u64, state: BlockState) -> Result<(), StorageError> {
        self.storage.update_block_state(number, state)?;
        trace!(target: "ingest::tracker", number, %state, "Updated block state");
        Ok(())
    }

    /// Moves `number` from `expected` to `new` atomically.
    ///
    /// Returns `false`, leaving the record untouched, if the current state is not `expected`.
    pub fn transition(
        &self,
        number: u64,
        expected: Option<BlockState>,
        new: BlockState,
    ) -> Result<bool, StorageError> {
        self.storage.compare_and_set_block_state(number, expected, new)
    }

    /// Marks a confirmed block as needing reconciliation.
    pub fn invalidate(&self, number: u64) -> Result<bool, StorageError> {
        self.transition(number, Some(BlockState::Confirmed), BlockState::Dirty)
    }
}
