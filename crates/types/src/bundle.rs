//! Everything fetched from the chain for one block.

use crate::{BlockRecord, LogRecord, ReceiptRecord};
use alloy_consensus::TxReceipt;
use alloy_rpc_types_eth::{Block, TransactionReceipt};

/// A block together with its receipts and logs.
///
/// `logs` is the concatenation of every receipt's logs, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockBundle {
    /// The block header document.
    pub block: BlockRecord,
    /// One receipt per transaction, ordered by transaction index.
    pub receipts: Vec<ReceiptRecord>,
    /// All logs emitted in the block, ordered by log index.
    pub logs: Vec<LogRecord>,
}

impl BlockBundle {
    /// Creates a new [`BlockBundle`] from already converted records.
    pub fn new(block: BlockRecord, receipts: Vec<ReceiptRecord>) -> Self {
        let logs = receipts.iter().flat_map(|receipt| receipt.logs.iter().cloned()).collect();
        Self { block, receipts, logs }
    }

    /// Builds a [`BlockBundle`] from the RPC representations of a block and its receipts.
    ///
    /// Inclusion fields the node left empty are filled in from the block header. Every log
    /// takes its block and transaction fields from the receipt that emitted it, and a missing
    /// log index is replaced by the log's position in the block.
    pub fn from_rpc<T>(block: &Block<T>, receipts: &[TransactionReceipt]) -> Self {
        let block = BlockRecord::from(block);
        let mut position = 0u64;
        let receipts = receipts
            .iter()
            .map(|receipt| {
                let mut record = ReceiptRecord::from(receipt);
                if receipt.block_hash.is_none() {
                    record.block_hash = block.hash;
                }
                if receipt.block_number.is_none() {
                    record.block_number = block.number;
                }
                for (log, rpc_log) in record.logs.iter_mut().zip(receipt.inner.logs()) {
                    log.block_number = block.number;
                    log.block_hash = block.hash;
                    log.transaction_hash = record.transaction_hash;
                    log.transaction_index = record.transaction_index;
                    if rpc_log.log_index.is_none() {
                        log.log_index = position;
                    }
                    position += 1;
                }
                record
            })
            .collect();
        Self::new(block, receipts)
    }

    /// Returns the block number.
    pub const fn number(&self) -> u64 {
        self.block.number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_consensus::{Eip658Value, Receipt, ReceiptEnvelope, ReceiptWithBloom};
    use alloy_primitives::{Address, B256, Bloom, Bytes, LogData};
    use alloy_rpc_types_eth::{BlockTransactions, Header, Log};

    fn receipt(index: u64, logs: usize) -> ReceiptRecord {
        ReceiptRecord {
            transaction_index: index,
            transaction_hash: B256::repeat_byte(index as u8),
            logs: (0..logs).map(|_| LogRecord::default()).collect(),
            ..Default::default()
        }
    }

    fn rpc_block(number: u64, hash: B256) -> Block {
        Block {
            header: Header {
                hash,
                inner: alloy_consensus::Header {
                    number,
                    parent_hash: B256::repeat_byte(0x11),
                    ..Default::default()
                },
                total_difficulty: None,
                size: None,
            },
            uncles: vec![],
            transactions: BlockTransactions::Hashes(vec![
                B256::repeat_byte(0xa0),
                B256::repeat_byte(0xa1),
            ]),
            withdrawals: None,
        }
    }

    fn rpc_log(payload: &'static [u8], log_index: Option<u64>) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(0xcc),
                data: LogData::new_unchecked(vec![], Bytes::from_static(payload)),
            },
            block_hash: None,
            block_number: None,
            block_timestamp: None,
            transaction_hash: None,
            transaction_index: None,
            log_index,
            removed: false,
        }
    }

    fn rpc_receipt(index: u64, logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            inner: ReceiptEnvelope::Legacy(ReceiptWithBloom {
                receipt: Receipt {
                    status: Eip658Value::Eip658(true),
                    cumulative_gas_used: 21_000 * (index + 1),
                    logs,
                },
                logs_bloom: Bloom::default(),
            }),
            transaction_hash: B256::repeat_byte(0xa0 + index as u8),
            transaction_index: Some(index),
            block_hash: None,
            block_number: None,
            gas_used: 21_000,
            effective_gas_price: 1,
            blob_gas_used: None,
            blob_gas_price: None,
            from: Address::ZERO,
            to: None,
            contract_address: None,
        }
    }

    #[test]
    fn test_logs_are_flattened_in_receipt_order() {
        let block = BlockRecord { number: 5, ..Default::default() };
        let bundle = BlockBundle::new(block, vec![receipt(0, 2), receipt(1, 0), receipt(2, 1)]);

        assert_eq!(bundle.number(), 5);
        assert_eq!(bundle.receipts.len(), 3);
        assert_eq!(bundle.logs.len(), 3);
    }

    #[test]
    fn test_from_rpc_fills_inclusion_fields() {
        let hash = B256::repeat_byte(0xbb);
        let block = rpc_block(77, hash);
        let receipts = vec![
            rpc_receipt(0, vec![rpc_log(b"first", None), rpc_log(b"second", None)]),
            rpc_receipt(1, vec![rpc_log(b"third", None)]),
        ];
        assert!(receipts[0].inner.status());

        let bundle = BlockBundle::from_rpc(&block, &receipts);

        assert_eq!(bundle.number(), 77);
        assert_eq!(bundle.block.hash, hash);
        assert_eq!(bundle.block.parent_hash, B256::repeat_byte(0x11));
        assert_eq!(bundle.block.transaction_count, 2);

        assert_eq!(bundle.receipts.len(), 2);
        for (index, receipt) in bundle.receipts.iter().enumerate() {
            assert_eq!(receipt.block_hash, hash);
            assert_eq!(receipt.block_number, 77);
            assert_eq!(receipt.transaction_index, index as u64);
            assert_eq!(receipt.status, 1);
        }

        let payloads: Vec<_> = bundle.logs.iter().map(|log| log.data.clone()).collect();
        assert_eq!(
            payloads,
            vec![
                Bytes::from_static(b"first"),
                Bytes::from_static(b"second"),
                Bytes::from_static(b"third"),
            ]
        );
        let inclusion: Vec<_> = bundle
            .logs
            .iter()
            .map(|log| (log.transaction_hash, log.transaction_index, log.log_index))
            .collect();
        assert_eq!(
            inclusion,
            vec![
                (B256::repeat_byte(0xa0), 0, 0),
                (B256::repeat_byte(0xa0), 0, 1),
                (B256::repeat_byte(0xa1), 1, 2),
            ]
        );
        assert!(bundle.logs.iter().all(|log| log.block_hash == hash && log.block_number == 77));
        // The receipt documents carry the same logs.
        assert_eq!(bundle.receipts[1].logs, bundle.logs[2..].to_vec());
    }

    #[test]
    fn test_from_rpc_keeps_reported_fields() {
        let hash = B256::repeat_byte(0xbb);
        let mut receipt = rpc_receipt(0, vec![rpc_log(b"only", Some(9))]);
        receipt.block_hash = Some(B256::repeat_byte(0xdd));
        receipt.block_number = Some(78);

        let bundle = BlockBundle::from_rpc(&rpc_block(77, hash), &[receipt]);

        assert_eq!(bundle.receipts[0].block_hash, B256::repeat_byte(0xdd));
        assert_eq!(bundle.receipts[0].block_number, 78);
        assert_eq!(bundle.logs[0].log_index, 9);
        assert_eq!(bundle.logs[0].block_hash, hash);
    }
}
