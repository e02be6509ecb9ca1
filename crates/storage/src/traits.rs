use crate::{BlockItemKey, StorageError};
use alloy_primitives::B256;
use trawler_types::{BlockRecord, BlockState, LogRecord, ReceiptRecord};

/// Provides an interface for the per-block ingestion state.
///
/// A block number has at most one state record. Records are created once and never deleted.
/// A stored record that cannot be decoded is reported as absent, never as an error.
///
/// Implementations are expected to provide persistent and thread-safe access to the state.
pub trait BlockStateStorage {
    /// Gets the [`BlockState`] of `number`.
    ///
    /// # Returns
    /// * `Ok(Some(state))` if a well-formed record exists.
    /// * `Ok(None)` if no record exists or the stored record is malformed.
    /// * `Err(StorageError)` if the storage could not be read.
    fn block_state(&self, number: u64) -> Result<Option<BlockState>, StorageError>;

    /// Creates a [`BlockState::Pending`] record for `number` unless a well-formed one exists.
    ///
    /// A malformed record is replaced.
    ///
    /// # Returns
    /// * `Ok(true)` if a record was written.
    /// * `Ok(false)` if a record already existed and was left untouched.
    fn insert_block_state(&self, number: u64) -> Result<bool, StorageError>;

    /// Overwrites the state of an existing record.
    ///
    /// # Returns
    /// * `Err(StorageError::EntryNotFound)` if `number` has no well-formed record.
    fn update_block_state(&self, number: u64, state: BlockState) -> Result<(), StorageError>;

    /// Atomically replaces the state of `number` with `new` if the current state equals
    /// `expected`, where `None` stands for "no record".
    ///
    /// # Returns
    /// * `Ok(true)` if the state was replaced.
    /// * `Ok(false)` if the current state did not match `expected`.
    fn compare_and_set_block_state(
        &self,
        number: u64,
        expected: Option<BlockState>,
        new: BlockState,
    ) -> Result<bool, StorageError>;
}

/// Provides an interface for persisting and reading ingested block data.
///
/// All tables are keyed, so inserting the same record twice overwrites it.
pub trait BlockDataStorage {
    /// Stores the block document under its number and indexes it by hash.
    fn insert_block(&self, block: &BlockRecord) -> Result<(), StorageError>;

    /// Stores every receipt of block `number` keyed by transaction index and indexes each
    /// receipt by transaction hash.
    fn insert_receipts(&self, number: u64, receipts: &[ReceiptRecord]) -> Result<(), StorageError>;

    /// Stores every log of block `number` keyed by log index.
    fn insert_logs(&self, number: u64, logs: &[LogRecord]) -> Result<(), StorageError>;

    /// Removes the block, receipts and logs stored for `number`, together with their index
    /// entries. Removing a block with no stored data is a no-op.
    ///
    /// # Returns
    /// * `Ok(BlockDeletion)` describing what was removed.
    fn delete_block(&self, number: u64) -> Result<BlockDeletion, StorageError>;

    /// Gets the block document stored for `number`.
    fn get_block(&self, number: u64) -> Result<Option<BlockRecord>, StorageError>;

    /// Gets the receipts stored for `number`, ordered by transaction index.
    fn get_receipts(&self, number: u64) -> Result<Vec<ReceiptRecord>, StorageError>;

    /// Gets the logs stored for `number`, ordered by log index.
    fn get_logs(&self, number: u64) -> Result<Vec<LogRecord>, StorageError>;
}

/// Provides access to the secondary indexes over stored blocks and receipts.
pub trait IndexStorage {
    /// Clears both index tables and repopulates them from the primary tables.
    fn rebuild_indexes(&self) -> Result<IndexStats, StorageError>;

    /// Looks up the number under which the block with `hash` is stored.
    fn block_number_by_hash(&self, hash: B256) -> Result<Option<u64>, StorageError>;

    /// Looks up where the receipt of the transaction with `hash` is stored.
    fn receipt_location_by_tx_hash(&self, hash: B256)
    -> Result<Option<BlockItemKey>, StorageError>;
}

/// What [`BlockDataStorage::delete_block`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockDeletion {
    /// Whether a block document was removed.
    pub block: bool,
    /// Number of receipts removed.
    pub receipts: usize,
    /// Number of logs removed.
    pub logs: usize,
}

impl BlockDeletion {
    /// Returns `true` if nothing was stored for the block.
    pub const fn is_empty(&self) -> bool {
        !self.block && self.receipts == 0 && self.logs == 0
    }
}

/// Entry counts written by [`IndexStorage::rebuild_indexes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Entries written to the block hash index.
    pub blocks: usize,
    /// Entries written to the transaction hash index.
    pub receipts: usize,
}
