//! Models for the per-block ingestion state.

use reth_db::table::Table;
use serde::{Deserialize, Serialize};
use trawler_types::BlockStateRecord;

/// Stored form of a [`BlockStateRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct StoredBlockState(pub(crate) BlockStateRecord);

impl From<BlockStateRecord> for StoredBlockState {
    fn from(record: BlockStateRecord) -> Self {
        Self(record)
    }
}

impl From<StoredBlockState> for BlockStateRecord {
    fn from(stored: StoredBlockState) -> Self {
        stored.0
    }
}

/// A table holding the ingestion state of every block number the pipeline has touched.
///
/// - **Key**: `u64` (block number)
/// - **Value**: [`StoredBlockState`] (`{ blockNumber, blockState }` document)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct BlockStates;

impl Table for BlockStates {
    const NAME: &'static str = "block_states";
    const DUPSORT: bool = false;
    type Key = u64;
    type Value = StoredBlockState;
}
