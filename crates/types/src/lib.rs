#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod state;
pub use state::{BlockState, BlockStateRecord};

mod block;
pub use block::BlockRecord;

mod receipt;
pub use receipt::ReceiptRecord;

mod log;
pub use log::LogRecord;

mod bundle;
pub use bundle::BlockBundle;
