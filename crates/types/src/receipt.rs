//! Transaction receipt document.

use crate::LogRecord;
use alloy_consensus::{Eip658Value, TxReceipt};
use alloy_primitives::{Address, B256, Bloom};
use alloy_rpc_types_eth::TransactionReceipt;
use serde::{Deserialize, Serialize};

/// The result of executing one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    // Consensus fields.
    /// Post-transaction state root, only present on pre-Byzantium receipts.
    #[serde(rename = "root")]
    pub post_state: Option<B256>,
    /// `1` on success, `0` on failure.
    pub status: u64,
    /// Gas used by the block up to and including this transaction.
    pub cumulative_gas_used: u64,
    /// Bloom filter over the receipt logs.
    pub logs_bloom: Bloom,
    /// Logs emitted by the transaction, in order.
    pub logs: Vec<LogRecord>,

    // Implementation fields.
    /// Hash of the transaction.
    pub transaction_hash: B256,
    /// Address of the created contract, for contract creation transactions.
    pub contract_address: Option<Address>,
    /// Gas used by this transaction alone.
    pub gas_used: u64,

    // Inclusion fields.
    /// Hash of the block containing the transaction.
    pub block_hash: B256,
    /// Number of the block containing the transaction.
    pub block_number: u64,
    /// Index of the transaction within the block.
    pub transaction_index: u64,
}

impl From<&TransactionReceipt> for ReceiptRecord {
    fn from(receipt: &TransactionReceipt) -> Self {
        let post_state = match receipt.inner.status_or_post_state() {
            Eip658Value::PostState(root) => Some(root),
            Eip658Value::Eip658(_) => None,
        };

        Self {
            post_state,
            status: u64::from(receipt.inner.status()),
            cumulative_gas_used: receipt.inner.cumulative_gas_used(),
            logs_bloom: receipt.inner.bloom(),
            logs: receipt.inner.logs().iter().map(LogRecord::from).collect(),
            transaction_hash: receipt.transaction_hash,
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used,
            block_hash: receipt.block_hash.unwrap_or_default(),
            block_number: receipt.block_number.unwrap_or_default(),
            transaction_index: receipt.transaction_index.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_keys() {
        let receipt = ReceiptRecord {
            post_state: Some(B256::repeat_byte(0x01)),
            status: 1,
            logs: vec![LogRecord::default()],
            ..Default::default()
        };
        let value = serde_json::to_value(&receipt).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "root",
            "status",
            "cumulativeGasUsed",
            "logsBloom",
            "logs",
            "transactionHash",
            "contractAddress",
            "gasUsed",
            "blockHash",
            "blockNumber",
            "transactionIndex",
        ] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(object.len(), 11);
        assert_eq!(object["logs"].as_array().unwrap().len(), 1);
    }
}
