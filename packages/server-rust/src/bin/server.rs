//! Beacon server binary.
//!
//! Owns the telemetry lifecycle around the serve loop: providers are
//! constructed before the listener binds and shut down after the last
//! request drains.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing::info;

use beacon_server::network::{NetworkConfig, NetworkModule};
use beacon_server::telemetry::{
    LogConfig, LogFileConfig, LogRotation, ObservabilityConfig, OtelConfig, PrometheusConfig,
    Telemetry,
};

/// Command-line arguments for the Beacon server.
#[derive(Debug, Parser)]
#[command(name = "beacon-server", about = "HTTP server with tenant-aware tracing")]
struct Args {
    /// Bind host.
    #[arg(long, env = "BEACON_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Bind port (0 picks an ephemeral port).
    #[arg(long, env = "BEACON_PORT", default_value_t = 8080)]
    port: u16,

    /// Service name reported to the trace backend.
    #[arg(long, env = "BEACON_SERVICE_NAME", default_value = "beacon")]
    service_name: String,

    /// OTLP gRPC endpoint; omit to disable trace export.
    #[arg(long, env = "BEACON_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Trace sampling ratio in 0.0..=1.0.
    #[arg(long, env = "BEACON_SAMPLE_RATIO", default_value_t = 1.0)]
    sample_ratio: f64,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, env = "BEACON_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Directory for rolling JSON log files; omit to log to stdout only.
    #[arg(long, env = "BEACON_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Prometheus scrape address; omit to disable the metrics exporter.
    #[arg(long, env = "BEACON_PROMETHEUS_ADDR")]
    prometheus_addr: Option<SocketAddr>,

    /// Allowed CORS origins ("*" for any).
    #[arg(long, env = "BEACON_CORS_ORIGIN", default_value = "*")]
    cors_origins: Vec<String>,

    /// Request timeout in seconds.
    #[arg(long, env = "BEACON_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

impl Args {
    fn observability_config(&self) -> ObservabilityConfig {
        ObservabilityConfig {
            service_name: self.service_name.clone(),
            otel: self.otlp_endpoint.clone().map(|endpoint| OtelConfig {
                endpoint,
                sample_ratio: self.sample_ratio,
            }),
            log: LogConfig {
                level: self.log_level.clone(),
                file: self.log_dir.clone().map(|directory| LogFileConfig {
                    directory,
                    file_name: format!("{}.log", self.service_name),
                    rotation: LogRotation::Daily,
                }),
            },
            prometheus: self.prometheus_addr.map(|listen| PrometheusConfig { listen }),
        }
    }

    fn network_config(self) -> NetworkConfig {
        NetworkConfig {
            host: self.host,
            port: self.port,
            tls: None,
            cors_origins: self.cors_origins,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let telemetry =
        Telemetry::init(&args.observability_config()).context("telemetry bootstrap failed")?;

    let service_name = args.service_name.clone();
    let mut module = NetworkModule::new(args.network_config());
    let port = module.start().await.context("failed to bind listener")?;
    info!(port, service = %service_name, "beacon server listening");

    module
        .serve(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server exited with an error")?;

    telemetry.shutdown().context("telemetry shutdown failed")?;
    Ok(())
}
