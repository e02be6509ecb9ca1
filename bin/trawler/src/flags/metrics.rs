use clap::Args;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Prometheus exporter arguments.
#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    /// Serve Prometheus metrics.
    #[arg(long = "metrics.enabled", env = "TRAWLER_METRICS_ENABLED", default_value_t = false)]
    pub enabled: bool,

    /// Address the metrics server listens on.
    #[arg(
        long = "metrics.addr",
        env = "TRAWLER_METRICS_ADDR",
        default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    )]
    pub addr: IpAddr,

    /// Port the metrics server listens on.
    #[arg(long = "metrics.port", env = "TRAWLER_METRICS_PORT", default_value_t = 9090)]
    pub port: u16,
}

impl MetricsArgs {
    /// Socket address of the metrics server.
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}
