use clap::Args;
use std::{path::PathBuf, time::Duration};
use trawler_ingest::{
    DEFAULT_MAX_CATCHUP, DEFAULT_REORG_MARGIN, DEFAULT_REORG_MAX_DEPTH, IngestConfig, RetryConfig,
};
use url::Url;

/// Chain, storage and pipeline arguments.
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// URL of the chain's JSON-RPC endpoint.
    #[arg(long = "eth-rpc", env = "TRAWLER_ETH_RPC")]
    pub eth_rpc: Url,

    /// Directory holding the database.
    #[arg(long, env = "TRAWLER_DATADIR")]
    pub datadir: PathBuf,

    /// Name of the database directory under the datadir.
    #[arg(long = "database-name", env = "TRAWLER_DATABASE_NAME", default_value = "trawler")]
    pub database_name: String,

    /// Rebuild the secondary indexes before ingestion starts.
    #[arg(long = "index.rebuild", env = "TRAWLER_INDEX_REBUILD", default_value_t = false)]
    pub index_rebuild: bool,

    /// Number of blocks behind the chain head considered final.
    #[arg(long = "reorg.margin", env = "TRAWLER_REORG_MARGIN", default_value_t = DEFAULT_REORG_MARGIN)]
    pub reorg_margin: u64,

    /// Maximum number of ancestors inspected when a reorg is detected.
    #[arg(
        long = "reorg.max-depth",
        env = "TRAWLER_REORG_MAX_DEPTH",
        default_value_t = DEFAULT_REORG_MAX_DEPTH
    )]
    pub reorg_max_depth: u64,

    /// Height the backfill starts from, instead of one below the frontier.
    #[arg(long = "backfill.start-height", env = "TRAWLER_BACKFILL_START_HEIGHT")]
    pub backfill_start_height: Option<u64>,

    /// Head poll interval, in seconds.
    #[arg(
        long = "head.poll-interval",
        env = "TRAWLER_HEAD_POLL_INTERVAL",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub head_poll_interval: u64,

    /// Maximum number of blocks the head follower ingests per poll.
    #[arg(
        long = "head.max-catchup",
        env = "TRAWLER_HEAD_MAX_CATCHUP",
        default_value_t = DEFAULT_MAX_CATCHUP
    )]
    pub head_max_catchup: u64,

    /// Number of retries for a failed chain or storage call.
    #[arg(
        long = "retry.max-times",
        env = "TRAWLER_RETRY_MAX_TIMES",
        default_value_t = RetryConfig::DEFAULT_MAX_TIMES
    )]
    pub retry_max_times: usize,

    /// Delay before the first retry, in milliseconds.
    #[arg(long = "retry.min-delay", env = "TRAWLER_RETRY_MIN_DELAY", default_value_t = 200)]
    pub retry_min_delay: u64,

    /// Upper bound on the delay between retries, in milliseconds.
    #[arg(long = "retry.max-delay", env = "TRAWLER_RETRY_MAX_DELAY", default_value_t = 10_000)]
    pub retry_max_delay: u64,
}

impl IngestArgs {
    /// Path of the database directory.
    pub fn database_path(&self) -> PathBuf {
        self.datadir.join(&self.database_name)
    }

    /// Builds the pipeline configuration.
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            reorg_margin: self.reorg_margin,
            reorg_max_depth: self.reorg_max_depth,
            backfill_start: self.backfill_start_height,
            poll_interval: Duration::from_secs(self.head_poll_interval),
            max_catchup: self.head_max_catchup,
            retry: RetryConfig {
                max_times: self.retry_max_times,
                min_delay: Duration::from_millis(self.retry_min_delay),
                max_delay: Duration::from_millis(self.retry_max_delay),
            },
        }
    }
}
