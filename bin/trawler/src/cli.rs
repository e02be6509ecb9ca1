//! Contains the trawler CLI.

use crate::{
    flags::{IngestArgs, LogArgs, MetricsArgs},
    telemetry,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use trawler_ingest::{AlloyChainClient, IngestService};
use trawler_storage::{ChainDb, IndexStorage};

/// Ingests blocks, receipts and logs of an EVM chain into a local database.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Chain, storage and pipeline arguments.
    #[command(flatten)]
    pub ingest: IngestArgs,
    /// Logging arguments.
    #[command(flatten)]
    pub log: LogArgs,
    /// Prometheus arguments.
    #[command(flatten)]
    pub metrics: MetricsArgs,
}

impl Cli {
    /// Runs the CLI.
    pub fn run(self) -> Result<()> {
        telemetry::init_tracing(&self.log)?;

        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("Failed to build tokio runtime")?;
        rt.block_on(self.start())
    }

    /// Opens the database, connects to the chain and runs the pipeline until ctrl-c.
    pub async fn start(self) -> Result<()> {
        telemetry::init_prometheus_server(&self.metrics)?;

        let path = self.ingest.database_path();
        let storage = Arc::new(
            ChainDb::new(&path)
                .with_context(|| format!("Failed to open database at '{}'", path.display()))?,
        );

        if self.ingest.index_rebuild {
            let stats = storage.rebuild_indexes().context("Failed to rebuild indexes")?;
            info!(
                target: "trawler",
                blocks = stats.blocks,
                receipts = stats.receipts,
                "Rebuilt secondary indexes"
            );
        }

        let url = self.ingest.eth_rpc.clone();
        let (client, chain_id) = AlloyChainClient::connect(url.clone())
            .await
            .with_context(|| format!("Failed to connect to chain RPC at '{url}'"))?;
        info!(target: "trawler", %url, chain_id, "Connected to chain");

        let cancellation = CancellationToken::new();
        tokio::spawn(shutdown_on_ctrl_c(cancellation.clone()));

        IngestService::new(
            Arc::new(client),
            storage,
            self.ingest.ingest_config(),
            cancellation,
        )
        .run()
        .await
        .context("Ingestion stopped")?;

        info!(target: "trawler", "Shut down");
        Ok(())
    }
}

async fn shutdown_on_ctrl_c(cancellation: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!(target: "trawler", "Received ctrl-c, shutting down");
            cancellation.cancel();
        }
        Err(err) => warn!(target: "trawler", %err, "Failed to listen for ctrl-c"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parses_all_groups() {
        let cli = Cli::try_parse_from([
            "trawler",
            "--eth-rpc",
            "http://localhost:8545",
            "--datadir",
            "/var/lib/trawler",
            "--log.filter",
            "debug",
            "--metrics.enabled",
        ])
        .unwrap();

        assert_eq!(cli.ingest.database_path(), PathBuf::from("/var/lib/trawler/trawler"));
        assert_eq!(cli.log.filter, "debug");
        assert!(cli.metrics.enabled);
    }

    #[test]
    fn test_cli_requires_datadir() {
        let result = Cli::try_parse_from(["trawler", "--eth-rpc", "http://localhost:8545"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_debug_assert() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
