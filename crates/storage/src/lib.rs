#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod error;
pub use error::StorageError;

mod models;
pub use models::BlockItemKey;

mod providers;

mod traits;
pub use traits::{BlockDataStorage, BlockDeletion, BlockStateStorage, IndexStats, IndexStorage};

mod chaindb;
pub use chaindb::ChainDb;
