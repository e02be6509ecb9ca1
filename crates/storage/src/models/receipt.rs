//! Models for storing transaction receipts.

use crate::models::BlockItemKey;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};
use trawler_types::ReceiptRecord;

/// Stored form of a [`ReceiptRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct StoredReceipt(pub(crate) ReceiptRecord);

impl From<ReceiptRecord> for StoredReceipt {
    fn from(receipt: ReceiptRecord) -> Self {
        Self(receipt)
    }
}

impl From<StoredReceipt> for ReceiptRecord {
    fn from(stored: StoredReceipt) -> Self {
        stored.0
    }
}

/// A table for storing receipts, one entry per transaction.
///
/// - **Key**: [`BlockItemKey`] (block number and transaction index)
/// - **Value**: [`StoredReceipt`] (receipt document)
///
/// Re-inserting a receipt at the same location overwrites the previous document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct Receipts;

impl Table for Receipts {
    const NAME: &'static str = "receipts";
    const DUPSORT: bool = false;
    type Key = BlockItemKey;
    type Value = StoredReceipt;
}
