//! Per-block ingestion state.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// The ingestion marker kept for every block number the pipeline has touched.
///
/// Stored as its numeric discriminant, so the on-disk encoding is `0`, `1` or `2`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum BlockState {
    /// The block has been registered but its data is not fully persisted.
    #[display("pending")]
    Pending = 0,
    /// Persisted data for the block is stale and must be deleted before re-ingestion.
    #[display("dirty")]
    Dirty = 1,
    /// Block, receipts and logs have been persisted.
    #[display("confirmed")]
    Confirmed = 2,
}

/// The stored state document for a single block number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStateRecord {
    /// The block number this record tracks.
    #[serde(rename = "blockNumber")]
    pub number: u64,
    /// The current ingestion state.
    #[serde(rename = "blockState")]
    pub state: BlockState,
}

impl BlockStateRecord {
    /// Creates a new [`BlockStateRecord`].
    pub const fn new(number: u64, state: BlockState) -> Self {
        Self { number, state }
    }
}
