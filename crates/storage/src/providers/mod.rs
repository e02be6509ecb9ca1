//! Providers for transactional access to trawler tables.
//!
//! Each provider borrows an open transaction. Read operations are available on any [`DbTx`],
//! write operations additionally require [`DbTxMut`].
//!
//! [`DbTx`]: reth_db_api::transaction::DbTx
//! [`DbTxMut`]: reth_db_api::transaction::DbTxMut

mod state_provider;
pub(crate) use state_provider::StateProvider;

mod block_provider;
pub(crate) use block_provider::BlockProvider;

mod index_provider;
pub(crate) use index_provider::IndexProvider;
