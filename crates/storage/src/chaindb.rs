//! Main database access structure and transaction contexts.

use crate::{
    error::StorageError,
    models::{BlockItemKey, Tables},
    providers::{BlockProvider, IndexProvider, StateProvider},
    traits::{BlockDataStorage, BlockDeletion, BlockStateStorage, IndexStats, IndexStorage},
};
use alloy_primitives::B256;
use reth_db::{
    DatabaseEnv,
    mdbx::{DatabaseArguments, init_db_for},
};
use reth_db_api::{database::Database, transaction::DbTx};
use std::path::Path;
use tracing::{error, info};
use trawler_types::{BlockRecord, BlockState, LogRecord, ReceiptRecord};

/// Manages the database environment for the ingested chain.
/// Provides transactional access to data via providers.
///
/// Every trait method runs in its own transaction. Write transactions are committed only when
/// the operation succeeds and aborted otherwise, so a failed call leaves no partial writes.
#[derive(Debug)]
pub struct ChainDb {
    env: DatabaseEnv,
}

impl ChainDb {
    /// Creates or opens a database environment at the given path.
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        let env = init_db_for::<_, Tables>(path, DatabaseArguments::default()).map_err(|err| {
            error!(target: "storage", path = %path.display(), %err, "Failed to open database");
            StorageError::DatabaseInit(err.to_string())
        })?;
        info!(target: "storage", path = %path.display(), "Opened database");
        Ok(Self { env })
    }

    fn view<T>(
        &self,
        f: impl FnOnce(&<DatabaseEnv as Database>::TX) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        self.env.view(f)?
    }

    fn update<T>(
        &self,
        f: impl FnOnce(&<DatabaseEnv as Database>::TXMut) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let tx = self.env.tx_mut()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                tx.abort();
                Err(err)
            }
        }
    }
}

impl BlockStateStorage for ChainDb {
    fn block_state(&self, number: u64) -> Result<Option<BlockState>, StorageError> {
        self.view(|tx| StateProvider::new(tx).get_block_state(number))
    }

    fn insert_block_state(&self, number: u64) -> Result<bool, StorageError> {
        self.update(|tx| StateProvider::new(tx).insert_block_state(number))
    }

    fn update_block_state(&self, number: u64, state: BlockState) -> Result<(), StorageError> {
        self.update(|tx| StateProvider::new(tx).update_block_state(number, state))
    }

    fn compare_and_set_block_state(
        &self,
        number: u64,
        expected: Option<BlockState>,
        new: BlockState,
    ) -> Result<bool, StorageError> {
        self.update(|tx| StateProvider::new(tx).compare_and_set_block_state(number, expected, new))
    }
}

impl BlockDataStorage for ChainDb {
    fn insert_block(&self, block: &BlockRecord) -> Result<(), StorageError> {
        self.update(|tx| BlockProvider::new(tx).insert_block(block))
    }

    fn insert_receipts(&self, number: u64, receipts: &[ReceiptRecord]) -> Result<(), StorageError> {
        self.update(|tx| BlockProvider::new(tx).insert_receipts(number, receipts))
    }

    fn insert_logs(&self, number: u64, logs: &[LogRecord]) -> Result<(), StorageError> {
        self.update(|tx| BlockProvider::new(tx).insert_logs(number, logs))
    }

    fn delete_block(&self, number: u64) -> Result<BlockDeletion, StorageError> {
        self.update(|tx| BlockProvider::new(tx).delete_block(number))
    }

    fn get_block(&self, number: u64) -> Result<Option<BlockRecord>, StorageError> {
        self.view(|tx| BlockProvider::new(tx).get_block(number))
    }

    fn get_receipts(&self, number: u64) -> Result<Vec<ReceiptRecord>, StorageError> {
        self.view(|tx| BlockProvider::new(tx).get_receipts(number))
    }

    fn get_logs(&self, number: u64) -> Result<Vec<LogRecord>, StorageError> {
        self.view(|tx| BlockProvider::new(tx).get_logs(number))
    }
}

impl IndexStorage for ChainDb {
    fn rebuild_indexes(&self) -> Result<IndexStats, StorageError> {
        self.update(|tx| IndexProvider::new(tx).rebuild())
    }

    fn block_number_by_hash(&self, hash: B256) -> Result<Option<u64>, StorageError> {
        self.view(|tx| IndexProvider::new(tx).block_number_by_hash(hash))
    }

    fn receipt_location_by_tx_hash(
        &self,
        hash: B256,
    ) -> Result<Option<BlockItemKey>, StorageError> {
        self.view(|tx| IndexProvider::new(tx).receipt_location_by_tx_hash(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_and_open_db() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let db_path = tmp_dir.path().join("chaindb");
        let db = ChainDb::new(&db_path);
        assert!(db.is_ok(), "Should create or open database");
    }

    #[test]
    fn test_failed_update_is_rolled_back() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        let db = ChainDb::new(tmp_dir.path()).unwrap();

        let result: Result<(), _> = db.update(|tx| {
            StateProvider::new(tx).insert_block_state(1)?;
            Err(StorageError::EntryNotFound("forced".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.block_state(1).unwrap(), None);
    }

    #[test]
    fn test_state_survives_reopen() {
        let tmp_dir = TempDir::new().expect("create temp dir");
        {
            let db = ChainDb::new(tmp_dir.path()).unwrap();
            db.insert_block_state(12).unwrap();
            db.update_block_state(12, BlockState::Confirmed).unwrap();
        }
        let db = ChainDb::new(tmp_dir.path()).unwrap();
        assert_eq!(db.block_state(12).unwrap(), Some(BlockState::Confirmed));
    }
}
