#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

#[macro_use]
extern crate tracing;

mod chain;
pub use chain::{AlloyChainClient, ChainClient, ChainClientError};

mod config;
pub use config::{
    BACKFILL_QUEUE_CAPACITY, DEFAULT_MAX_CATCHUP, DEFAULT_POLL_INTERVAL, DEFAULT_REORG_MARGIN,
    DEFAULT_REORG_MAX_DEPTH, IngestConfig, MIN_POLL_INTERVAL, frontier,
};

mod retry;
pub use retry::RetryConfig;

mod locks;
pub use locks::{BlockGuard, BlockLocks};

mod tracker;
pub use tracker::{BlockStateTracker, IngestStorage};

mod worker;
pub use worker::{IngestError, IngestOutcome, IngestWorker};

mod backfill;
pub use backfill::{
    BackfillConsumer, BackfillError, BackfillScanner, BackfillSummary, ConsumerSummary,
};

mod head;
pub use head::HeadFollower;

mod reorg;
pub use reorg::ReorgDetector;

mod service;
pub use service::{IngestService, ServiceError};

mod metrics;
pub use crate::metrics::Metrics;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
