//! Event log document.

use alloy_primitives::{Address, B256, Bytes};
use serde::{Deserialize, Serialize};

/// A contract log event, as emitted by the `LOG` opcodes and reported by the node.
///
/// Every field is stored under its own key:
///
/// | field               | key                |
/// |---------------------|--------------------|
/// | `address`           | `address`          |
/// | `topics`            | `topics`           |
/// | `data`              | `data`             |
/// | `block_number`      | `blockNumber`      |
/// | `transaction_hash`  | `transactionHash`  |
/// | `transaction_index` | `transactionIndex` |
/// | `block_hash`        | `blockHash`        |
/// | `log_index`         | `logIndex`         |
/// | `removed`           | `removed`          |
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    // Consensus fields.
    /// Address of the contract that emitted the event.
    pub address: Address,
    /// Indexed topics, in emission order.
    pub topics: Vec<B256>,
    /// Opaque payload, usually ABI encoded.
    pub data: Bytes,

    // Derived fields, filled in by the node.
    /// Number of the block containing the log.
    pub block_number: u64,
    /// Hash of the transaction that emitted the log.
    pub transaction_hash: B256,
    /// Index of that transaction within the block.
    pub transaction_index: u64,
    /// Hash of the block containing the log.
    pub block_hash: B256,
    /// Index of the log within the block.
    pub log_index: u64,
    /// Set when the log was reverted by a chain reorganization.
    pub removed: bool,
}

impl From<&alloy_rpc_types_eth::Log> for LogRecord {
    fn from(log: &alloy_rpc_types_eth::Log) -> Self {
        Self {
            address: log.inner.address,
            topics: log.inner.data.topics().to_vec(),
            data: log.inner.data.data.clone(),
            block_number: log.block_number.unwrap_or_default(),
            transaction_hash: log.transaction_hash.unwrap_or_default(),
            transaction_index: log.transaction_index.unwrap_or_default(),
            block_hash: log.block_hash.unwrap_or_default(),
            log_index: log.log_index.unwrap_or_default(),
            removed: log.removed,
        }
    }
}
