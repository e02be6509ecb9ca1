//! Models for storing emitted event logs.
//!
//! Each log is uniquely identified by its block number and index within the block, so a
//! range walk over a single block returns its logs in emission order.

use crate::models::BlockItemKey;
use reth_db::table::Table;
use serde::{Deserialize, Serialize};
use trawler_types::LogRecord;

/// Stored form of a [`LogRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct StoredLog(pub(crate) LogRecord);

impl From<LogRecord> for StoredLog {
    fn from(log: LogRecord) -> Self {
        Self(log)
    }
}

impl From<StoredLog> for LogRecord {
    fn from(stored: StoredLog) -> Self {
        stored.0
    }
}

/// A table for storing logs.
///
/// - **Key**: [`BlockItemKey`] (block number and log index)
/// - **Value**: [`StoredLog`] (log document)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct Logs;

impl Table for Logs {
    const NAME: &'static str = "logs";
    const DUPSORT: bool = false;
    type Key = BlockItemKey;
    type Value = StoredLog;
}
