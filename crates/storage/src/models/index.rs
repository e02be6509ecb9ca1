//! Secondary index tables.
//!
//! Both tables are derived data: they are maintained on every insert and delete of the primary
//! tables and can be rebuilt from them at any time.

use crate::models::BlockItemKey;
use alloy_primitives::B256;
use reth_db::table::Table;

/// Maps a block hash to the number it is stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct BlockNumbersByHash;

impl Table for BlockNumbersByHash {
    const NAME: &'static str = "block_numbers_by_hash";
    const DUPSORT: bool = false;
    type Key = B256;
    type Value = u64;
}

/// Maps a transaction hash to the location of its receipt in [`super::Receipts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct ReceiptsByTxHash;

impl Table for ReceiptsByTxHash {
    const NAME: &'static str = "receipts_by_tx_hash";
    const DUPSORT: bool = false;
    type Key = B256;
    type Value = BlockItemKey;
}
