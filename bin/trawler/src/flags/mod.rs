//! Command line flags.

mod ingest;
pub use ingest::IngestArgs;

mod log;
pub use log::LogArgs;

mod metrics;
pub use metrics::MetricsArgs;
