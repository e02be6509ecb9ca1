//! Block header document.

use alloy_primitives::{Address, B256, Bloom, Bytes};
use alloy_rpc_types_eth::Block;
use serde::{Deserialize, Serialize};

/// Header fields of an ingested block, plus the metadata used during reconciliation.
///
/// `hash` and `parent_hash` are what the reorg detector compares to decide whether a
/// stored block is still part of the canonical chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRecord {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The block timestamp, in seconds since the Unix epoch.
    pub timestamp: u64,
    /// The fee recipient of the block.
    #[serde(rename = "miner")]
    pub beneficiary: Address,
    /// The state root after executing the block.
    pub state_root: B256,
    /// The root of the transaction trie.
    pub transactions_root: B256,
    /// The root of the receipt trie.
    pub receipts_root: B256,
    /// The bloom filter over all logs in the block.
    pub logs_bloom: Bloom,
    /// The gas limit of the block.
    pub gas_limit: u64,
    /// The total gas used by the block.
    pub gas_used: u64,
    /// The base fee per gas, if the block is post-London.
    pub base_fee_per_gas: Option<u64>,
    /// Arbitrary extra data included by the block producer.
    pub extra_data: Bytes,
    /// The number of transactions in the block.
    pub transaction_count: u64,
}

impl<T> From<&Block<T>> for BlockRecord {
    fn from(block: &Block<T>) -> Self {
        let header = &block.header.inner;
        Self {
            number: header.number,
            hash: block.header.hash,
            parent_hash: header.parent_hash,
            timestamp: header.timestamp,
            beneficiary: header.beneficiary,
            state_root: header.state_root,
            transactions_root: header.transactions_root,
            receipts_root: header.receipts_root,
            logs_bloom: header.logs_bloom,
            gas_limit: header.gas_limit,
            gas_used: header.gas_used,
            base_fee_per_gas: header.base_fee_per_gas,
            extra_data: header.extra_data.clone(),
            transaction_count: block.transactions.len() as u64,
        }
    }
}
