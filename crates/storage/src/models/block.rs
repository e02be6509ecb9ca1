//! Models for storing block headers.
//!
//! Each block is uniquely identified by its number and does not require dup-sorting.

use reth_db::table::Table;
use serde::{Deserialize, Serialize};
use trawler_types::BlockRecord;

/// Stored form of a [`BlockRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct StoredBlock(pub(crate) BlockRecord);

impl From<BlockRecord> for StoredBlock {
    fn from(block: BlockRecord) -> Self {
        Self(block)
    }
}

impl From<StoredBlock> for BlockRecord {
    fn from(stored: StoredBlock) -> Self {
        stored.0
    }
}

/// A table for storing block documents by block number.
///
/// - **Key**: `u64` (block number)
/// - **Value**: [`StoredBlock`] (block header document)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct Blocks;

impl Table for Blocks {
    const NAME: &'static str = "blocks";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredBlock;
}
