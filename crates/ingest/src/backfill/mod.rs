//! Historical backfill: a scanner walking down to genesis and a consumer ingesting what it
//! finds, connected by a bounded queue.

mod scanner;
pub use scanner::{BackfillError, BackfillScanner, BackfillSummary};

mod consumer;
pub use consumer::{BackfillConsumer, ConsumerSummary};
