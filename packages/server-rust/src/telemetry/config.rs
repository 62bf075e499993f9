//! Observability configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level observability configuration for the server process.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name reported in trace resources.
    pub service_name: String,
    /// OTLP trace export. `None` disables trace export entirely.
    pub otel: Option<OtelConfig>,
    /// Log output configuration.
    pub log: LogConfig,
    /// Prometheus scrape endpoint. `None` disables the metrics exporter.
    pub prometheus: Option<PrometheusConfig>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "beacon".to_string(),
            otel: None,
            log: LogConfig::default(),
            prometheus: None,
        }
    }
}

/// OTLP trace pipeline configuration.
#[derive(Debug, Clone)]
pub struct OtelConfig {
    /// gRPC endpoint of the OTLP collector.
    pub endpoint: String,
    /// Fraction of traces to sample, in `0.0..=1.0`.
    pub sample_ratio: f64,
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4317".to_string(),
            sample_ratio: 1.0,
        }
    }
}

/// Log output configuration: console always, rolling file optional.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is not set (env-logger syntax).
    pub level: String,
    /// Rolling JSON log file. `None` logs to stdout only.
    pub file: Option<LogFileConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Rolling log file location and rotation cadence.
#[derive(Debug, Clone)]
pub struct LogFileConfig {
    /// Directory the log files are written to.
    pub directory: PathBuf,
    /// File name prefix; the rotation timestamp is appended.
    pub file_name: String,
    /// How often a new file is started.
    pub rotation: LogRotation,
}

/// Rotation cadence for the log file writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// New file every hour.
    Hourly,
    /// New file every day.
    Daily,
    /// Single file, never rotated.
    Never,
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone)]
pub struct PrometheusConfig {
    /// Address the scrape endpoint listens on.
    pub listen: SocketAddr,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observability_defaults_disable_optional_sections() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "beacon");
        assert!(config.otel.is_none());
        assert!(config.prometheus.is_none());
        assert!(config.log.file.is_none());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn otel_defaults_sample_everything() {
        let config = OtelConfig::default();
        assert_eq!(config.endpoint, "http://localhost:4317");
        assert!((config.sample_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn prometheus_default_listen_address() {
        let config = PrometheusConfig::default();
        assert_eq!(config.listen, SocketAddr::from(([0, 0, 0, 0], 9090)));
    }
}
