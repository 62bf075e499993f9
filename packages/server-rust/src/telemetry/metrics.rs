//! Prometheus metrics exporter installation.

use metrics_exporter_prometheus::PrometheusBuilder;

use super::config::PrometheusConfig;
use super::init::TelemetryError;

/// Installs the process-wide Prometheus recorder with an HTTP scrape
/// endpoint on the configured address.
///
/// Must be called from within a Tokio runtime; the exporter spawns its
/// listener task onto it.
///
/// # Errors
///
/// Returns an error when a recorder is already installed or the listener
/// cannot be set up.
pub fn init_metrics(config: &PrometheusConfig) -> Result<(), TelemetryError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen)
        .install()
        .map_err(TelemetryError::from)
}
