//! Provider for block state operations.

use crate::{
    error::StorageError,
    models::{BlockStates, StoredBlockState},
};
use reth_db_api::{
    DatabaseError,
    transaction::{DbTx, DbTxMut},
};
use tracing::{error, trace, warn};
use trawler_types::{BlockState, BlockStateRecord};

/// Provides access to the `block_states` table within a transaction.
#[derive(Debug)]
pub(crate) struct StateProvider<'tx, TX> {
    tx: &'tx TX,
}

impl<'tx, TX> StateProvider<'tx, TX> {
    /// Creates a new [`StateProvider`] instance.
    pub(crate) const fn new(tx: &'tx TX) -> Self {
        Self { tx }
    }
}

impl<TX> StateProvider<'_, TX>
where
    TX: DbTx,
{
    /// Gets the state of `number`, treating a malformed record as absent.
    pub(crate) fn get_block_state(&self, number: u64) -> Result<Option<BlockState>, StorageError> {
        match self.tx.get::<BlockStates>(number) {
            Ok(Some(StoredBlockState(record))) if record.number == number => Ok(Some(record.state)),
            Ok(Some(StoredBlockState(record))) => {
                warn!(
                    target: "storage",
                    number,
                    stored_number = record.number,
                    "Block state record stored under wrong number, treating as absent"
                );
                Ok(None)
            }
            Ok(None) => Ok(None),
            Err(DatabaseError::Decode) => {
                warn!(target: "storage", number, "Malformed block state record, treating as absent");
                Ok(None)
            }
            Err(err) => {
                error!(target: "storage", number, %err, "Failed to get block state");
                Err(err.into())
            }
        }
    }
}

impl<TX> StateProvider<'_, TX>
where
    TX: DbTxMut + DbTx,
{
    fn put_block_state(&self, number: u64, state: BlockState) -> Result<(), StorageError> {
        self.tx
            .put::<BlockStates>(number, BlockStateRecord::new(number, state).into())
            .inspect_err(|err| {
                error!(target: "storage", number, %state, %err, "Failed to write block state");
            })?;
        trace!(target: "storage", number, %state, "Wrote block state");
        Ok(())
    }

    /// Creates a pending record for `number` if no well-formed record exists.
    pub(crate) fn insert_block_state(&self, number: u64) -> Result<bool, StorageError> {
        if self.get_block_state(number)?.is_some() {
            return Ok(false);
        }
        self.put_block_state(number, BlockState::Pending)?;
        Ok(true)
    }

    /// Overwrites the state of an existing record.
    pub(crate) fn update_block_state(
        &self,
        number: u64,
        state: BlockState,
    ) -> Result<(), StorageError> {
        if self.get_block_state(number)?.is_none() {
            warn!(target: "storage", number, %state, "Block state not found for update");
            return Err(StorageError::EntryNotFound(format!("block state {number}")));
        }
        self.put_block_state(number, state)
    }

    /// Replaces the state of `number` with `new` if it currently equals `expected`.
    pub(crate) fn compare_and_set_block_state(
        &self,
        number: u64,
        expected: Option<BlockState>,
        new: BlockState,
    ) -> Result<bool, StorageError> {
        let current = self.get_block_state(number)?;
        if current != expected {
            trace!(
                target: "storage",
                number,
                ?current,
                ?expected,
                "Block state compare-and-set rejected"
            );
            return Ok(false);
        }
        self.put_block_state(number, new)?;
        Ok(true)
    }
}
