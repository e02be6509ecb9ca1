use reth_db_api::DatabaseError;
use thiserror::Error;

/// Errors that may occur while interacting with trawler storage.
///
/// This enum is used across all implementations of the storage traits.
#[derive(Debug, Error)]
pub enum StorageError {
    /// DatabaseError
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// The database environment could not be created or opened.
    #[error("Failed to initialize database: {0}")]
    DatabaseInit(String),

    /// The expected entry was not found in the database.
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
}
