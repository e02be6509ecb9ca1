//! Provider for block, receipt and log documents.

use crate::{
    error::StorageError,
    models::{
        BlockItemKey, BlockNumbersByHash, Blocks, Logs, Receipts, ReceiptsByTxHash, StoredBlock,
        StoredLog, StoredReceipt,
    },
    traits::BlockDeletion,
};
use alloy_primitives::B256;
use reth_db_api::{
    DatabaseError,
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use tracing::{debug, error, warn};
use trawler_types::{BlockRecord, LogRecord, ReceiptRecord};

/// Provides access to the primary data tables within a transaction.
#[derive(Debug)]
pub(crate) struct BlockProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> BlockProvider<'tx, TX> {
    /// Creates a new [`BlockProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> BlockProvider<'_, TX>
where
    TX: DbTx,
{
    /// Gets the block document stored for `number`.
    pub(crate) fn get_block(&self, number: u64) -> Result<Option<BlockRecord>, StorageError> {
        let block = self.tx.get::<Blocks>(number).inspect_err(|err| {
            error!(target: "storage", number, %err, "Failed to get block");
        })?;
        Ok(block.map(Into::into))
    }

    /// Gets the receipts stored for `number` in transaction index order.
    pub(crate) fn get_receipts(&self, number: u64) -> Result<Vec<ReceiptRecord>, StorageError> {
        Ok(self.receipts_in_block(number)?.into_iter().map(|(_, receipt)| receipt.into()).collect())
    }

    /// Gets the logs stored for `number` in log index order.
    pub(crate) fn get_logs(&self, number: u64) -> Result<Vec<LogRecord>, StorageError> {
        Ok(self.logs_in_block(number)?.into_iter().map(|(_, log)| log.into()).collect())
    }

    fn receipts_in_block(
        &self,
        number: u64,
    ) -> Result<Vec<(BlockItemKey, StoredReceipt)>, StorageError> {
        let mut cursor = self.tx.cursor_read::<Receipts>()?;
        let walker = cursor
            .walk_range(BlockItemKey::first(number)..=BlockItemKey::last(number))
            .inspect_err(|err| {
                error!(target: "storage", number, %err, "Failed to walk receipts");
            })?;
        Ok(walker.collect::<Result<Vec<_>, _>>()?)
    }

    fn logs_in_block(&self, number: u64) -> Result<Vec<(BlockItemKey, StoredLog)>, StorageError> {
        let mut cursor = self.tx.cursor_read::<Logs>()?;
        let walker = cursor
            .walk_range(BlockItemKey::first(number)..=BlockItemKey::last(number))
            .inspect_err(|err| {
                error!(target: "storage", number, %err, "Failed to walk logs");
            })?;
        Ok(walker.collect::<Result<Vec<_>, _>>()?)
    }
}

impl<TX> BlockProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Stores the block document and its hash index entry.
    pub(crate) fn insert_block(&self, block: &BlockRecord) -> Result<(), StorageError> {
        let number = block.number;
        self.tx.put::<Blocks>(number, StoredBlock::from(block.clone())).inspect_err(|err| {
            error!(target: "storage", number, %err, "Failed to insert block");
        })?;
        self.tx.put::<BlockNumbersByHash>(block.hash, number)?;
        Ok(())
    }

    /// Stores the receipts of block `number` and their transaction hash index entries.
    pub(crate) fn insert_receipts(
        &self,
        number: u64,
        receipts: &[ReceiptRecord],
    ) -> Result<(), StorageError> {
        for receipt in receipts {
            let key = BlockItemKey::new(number, receipt.transaction_index);
            self.tx.put::<Receipts>(key, StoredReceipt::from(receipt.clone())).inspect_err(
                |err| {
                    error!(
                        target: "storage",
                        number,
                        transaction_index = receipt.transaction_index,
                        %err,
                        "Failed to insert receipt"
                    );
                },
            )?;
            self.tx.put::<ReceiptsByTxHash>(receipt.transaction_hash, key)?;
        }
        Ok(())
    }

    /// Stores the logs of block `number`.
    pub(crate) fn insert_logs(&self, number: u64, logs: &[LogRecord]) -> Result<(), StorageError> {
        for log in logs {
            let key = BlockItemKey::new(number, log.log_index);
            self.tx.put::<Logs>(key, StoredLog::from(log.clone())).inspect_err(|err| {
                error!(
                    target: "storage",
                    number,
                    log_index = log.log_index,
                    %err,
                    "Failed to insert log"
                );
            })?;
        }
        Ok(())
    }

    /// Removes everything stored for `number`, including index entries that point at it.
    pub(crate) fn delete_block(&self, number: u64) -> Result<BlockDeletion, StorageError> {
        match self.tx.get::<Blocks>(number) {
            Ok(Some(StoredBlock(block))) => self.unindex_block(block.hash, number)?,
            Ok(None) => {}
            Err(DatabaseError::Decode) => {
                warn!(
                    target: "storage",
                    number,
                    "Malformed block document, dropping without index cleanup"
                );
            }
            Err(err) => return Err(err.into()),
        }
        let block = self.tx.delete::<Blocks>(number, None)?;

        let receipts = self.receipts_in_block(number)?;
        for (key, StoredReceipt(receipt)) in &receipts {
            self.tx.delete::<Receipts>(*key, None)?;
            if self.tx.get::<ReceiptsByTxHash>(receipt.transaction_hash)? == Some(*key) {
                self.tx.delete::<ReceiptsByTxHash>(receipt.transaction_hash, None)?;
            }
        }

        let logs = self.logs_in_block(number)?;
        for (key, _) in &logs {
            self.tx.delete::<Logs>(*key, None)?;
        }

        let deletion = BlockDeletion { block, receipts: receipts.len(), logs: logs.len() };
        debug!(target: "storage", number, ?deletion, "Deleted block data");
        Ok(deletion)
    }

    fn unindex_block(&self, hash: B256, number: u64) -> Result<(), StorageError> {
        if self.tx.get::<BlockNumbersByHash>(hash)? == Some(number) {
            self.tx.delete::<BlockNumbersByHash>(hash, None)?;
        }
        Ok(())
    }
}
