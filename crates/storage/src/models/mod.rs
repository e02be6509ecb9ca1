//! Database table schemas used by trawler.
//!
//! Every value is persisted as a JSON document. The record types live in `trawler-types`, so
//! each table value is a transparent local wrapper that carries the codec implementations.
//!
//! The tables are registered using [`reth_db_api::table::TableInfo`] and grouped into a
//! [`reth_db_api::TableSet`] for database initialization via Reth's storage-api.

mod key;
pub use key::BlockItemKey;
mod state;
pub(crate) use state::{BlockStates, StoredBlockState};
mod block;
pub(crate) use block::{Blocks, StoredBlock};
mod receipt;
pub(crate) use receipt::{Receipts, StoredReceipt};
mod log;
pub(crate) use log::{Logs, StoredLog};
mod index;
pub(crate) use index::{BlockNumbersByHash, ReceiptsByTxHash};

/// Implements [`reth_db_api::table::Compress`] and [`reth_db_api::table::Decompress`] for
/// serde types, storing them as JSON documents.
///
/// A value that fails to parse decodes to [`reth_db_api::DatabaseError::Decode`].
///
/// # Example
/// ```ignore
/// impl_json_document!(StoredBlock, StoredReceipt);
/// ```
macro_rules! impl_json_document {
    ($($name:ty),+ $(,)?) => {
        $(
            impl reth_db_api::table::Compress for $name {
                type Compressed = Vec<u8>;

                fn compress_to_buf<B: bytes::BufMut + AsMut<[u8]>>(&self, buf: &mut B) {
                    let _ = serde_json::to_writer(bytes::BufMut::writer(buf), self);
                }
            }

            impl reth_db_api::table::Decompress for $name {
                fn decompress(value: &[u8]) -> Result<$name, reth_db_api::DatabaseError> {
                    serde_json::from_slice(value).map_err(|_| reth_db_api::DatabaseError::Decode)
                }
            }
        )+
    };
}

/// Implements [`reth_db_api::table::TableInfo`] for one or more table types that implement
/// [`reth_db_api::table::Table`].
///
/// # Example
/// ```ignore
/// impl_table_info!(Blocks, Receipts);
/// ```
macro_rules! impl_table_info {
    ($($table:ty),+ $(,)?) => {
        $(
            impl reth_db_api::table::TableInfo for $table
            where
                $table: reth_db_api::table::Table,
            {
                fn name(&self) -> &'static str {
                    <$table as reth_db_api::table::Table>::NAME
                }

                fn is_dupsort(&self) -> bool {
                    <$table as reth_db_api::table::Table>::DUPSORT
                }
            }
        )+
    };
}

/// Declares a struct representing a collection of tables and implements [`reth_db_api::TableSet`]
/// for it.
///
/// The resulting struct is passed to Reth's `init_db_for::<_, YourTableSet>()` so only the
/// listed tables are created.
macro_rules! impl_table_set {
    (
        $(#[$outer:meta])*
        $set_name:ident, $($table:ty),+ $(,)?
    ) => {
        $(#[$outer])*
        #[derive(Debug)]
        pub(crate) struct $set_name;

        impl reth_db_api::TableSet for $set_name {
            fn tables() -> Box<dyn Iterator<Item = Box<dyn reth_db_api::table::TableInfo>>> {
                Box::new(vec![
                    $(
                        Box::new(<$table>::default()) as Box<dyn reth_db_api::table::TableInfo>
                    ),*
                ].into_iter())
            }
        }
    };
}

impl_json_document!(
    StoredBlockState,
    StoredBlock,
    StoredReceipt,
    StoredLog,
    BlockItemKey,
);

impl_table_info!(BlockStates, Blocks, Receipts, Logs, BlockNumbersByHash, ReceiptsByTxHash);

impl_table_set!(
    /// Every table owned by [`crate::ChainDb`].
    Tables,
    BlockStates,
    Blocks,
    Receipts,
    Logs,
    BlockNumbersByHash,
    ReceiptsByTxHash,
);
