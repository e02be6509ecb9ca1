//! Tracing and metrics bootstrap.

use crate::flags::{LogArgs, MetricsArgs};
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

/// Installs the global tracing subscriber.
pub fn init_tracing(args: &LogArgs) -> Result<()> {
    let filter = args.env_filter().context("Invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

/// Installs the Prometheus recorder and its HTTP listener, if enabled.
///
/// Must be called from within a tokio runtime.
pub fn init_prometheus_server(args: &MetricsArgs) -> Result<()> {
    if !args.enabled {
        return Ok(());
    }

    let addr = args.socket_addr();
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("Failed to start metrics server on {addr}"))?;

    info!(target: "trawler", "Serving metrics at: http://{}", addr);
    Ok(())
}
