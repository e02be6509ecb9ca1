//! Provider for the secondary index tables.

use crate::{
    error::StorageError,
    models::{BlockItemKey, BlockNumbersByHash, Blocks, Receipts, ReceiptsByTxHash},
    traits::IndexStats,
};
use alloy_primitives::B256;
use reth_db_api::{
    cursor::DbCursorRO,
    transaction::{DbTx, DbTxMut},
};
use tracing::{error, info};

/// Provides access to the hash indexes within a transaction.
#[derive(Debug)]
pub(crate) struct IndexProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> IndexProvider<'tx, TX> {
    /// Creates a new [`IndexProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> IndexProvider<'_, TX>
where
    TX: DbTx,
{
    pub(crate) fn block_number_by_hash(&self, hash: B256) -> Result<Option<u64>, StorageError> {
        Ok(self.tx.get::<BlockNumbersByHash>(hash)?)
    }

    pub(crate) fn receipt_location_by_tx_hash(
        &self,
        hash: B256,
    ) -> Result<Option<BlockItemKey>, StorageError> {
        Ok(self.tx.get::<ReceiptsByTxHash>(hash)?)
    }
}

impl<TX> IndexProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    /// Clears both index tables and repopulates them from `blocks` and `receipts`.
    pub(crate) fn rebuild(&self) -> Result<IndexStats, StorageError> {
        self.tx.clear::<BlockNumbersByHash>()?;
        self.tx.clear::<ReceiptsByTxHash>()?;

        let blocks = self
            .tx
            .cursor_read::<Blocks>()?
            .walk(None)?
            .map(|row| row.map(|(number, block)| (block.0.hash, number)))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| {
                error!(target: "storage", %err, "Failed to scan blocks for index rebuild");
            })?;
        for (hash, number) in &blocks {
            self.tx.put::<BlockNumbersByHash>(*hash, *number)?;
        }

        let receipts = self
            .tx
            .cursor_read::<Receipts>()?
            .walk(None)?
            .map(|row| row.map(|(key, receipt)| (receipt.0.transaction_hash, key)))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| {
                error!(target: "storage", %err, "Failed to scan receipts for index rebuild");
            })?;
        for (hash, key) in &receipts {
            self.tx.put::<ReceiptsByTxHash>(*hash, *key)?;
        }

        let stats = IndexStats { blocks: blocks.len(), receipts: receipts.len() };
        info!(target: "storage", blocks = stats.blocks, receipts = stats.receipts, "Rebuilt indexes");
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{StoredBlock, StoredReceipt, Tables},
        providers::BlockProvider,
    };
    use reth_db::{
        DatabaseEnv,
        mdbx::{DatabaseArguments, init_db_for},
    };
    use reth_db_api::Database;
    use tempfile::TempDir;
    use trawler_types::{BlockRecord, ReceiptRecord};

    fn setup_db() -> (TempDir, DatabaseEnv) {
        let temp_dir = TempDir::new().expect("Could not create temp dir");
        let db = init_db_for::<_, Tables>(temp_dir.path(), DatabaseArguments::default())
            .expect("Failed to init database");
        (temp_dir, db)
    }

    #[test]
    fn test_rebuild_restores_lost_and_drops_stale_entries() {
        let (_dir, db) = setup_db();
        let block = BlockRecord { number: 3, hash: B256::repeat_byte(0x33), ..Default::default() };
        let receipt = ReceiptRecord {
            block_number: 3,
            transaction_index: 1,
            transaction_hash: B256::repeat_byte(0xaa),
            ..Default::default()
        };

        let tx = db.tx_mut().unwrap();
        // Primary rows written without going through the indexing provider.
        tx.put::<Blocks>(3, StoredBlock::from(block.clone())).unwrap();
        tx.put::<Receipts>(BlockItemKey::new(3, 1), StoredReceipt::from(receipt)).unwrap();
        tx.put::<BlockNumbersByHash>(B256::repeat_byte(0xff), 99).unwrap();
        tx.commit().unwrap();

        let tx = db.tx_mut().unwrap();
        let stats = IndexProvider::new(&tx).rebuild().unwrap();
        tx.commit().unwrap();
        assert_eq!(stats, IndexStats { blocks: 1, receipts: 1 });

        let tx = db.tx().unwrap();
        let provider = IndexProvider::new(&tx);
        assert_eq!(provider.block_number_by_hash(block.hash).unwrap(), Some(3));
        assert_eq!(provider.block_number_by_hash(B256::repeat_byte(0xff)).unwrap(), None);
        assert_eq!(
            provider.receipt_location_by_tx_hash(B256::repeat_byte(0xaa)).unwrap(),
            Some(BlockItemKey::new(3, 1))
        );
        assert_eq!(BlockProvider::new(&tx).get_block(3).unwrap(), Some(block));
    }
}
