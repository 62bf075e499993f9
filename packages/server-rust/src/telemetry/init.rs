//! Telemetry lifecycle: construction, flushing, and shutdown.
//!
//! The tracer provider is built here and owned by [`Telemetry`], which the
//! process entry point holds until exit. The span pipeline is the OTLP
//! batch exporter wrapped in the tenant-enrichment decorator; this module
//! adds no export behavior of its own.

use opentelemetry::KeyValue;
use opentelemetry_otlp::{ExporterBuildError, SpanExporter, WithExportConfig};
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::trace::{BatchSpanProcessor, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_appender::non_blocking::WorkerGuard;

use super::config::{ObservabilityConfig, OtelConfig};
use super::logging::init_logging;
use super::metrics::init_metrics;
use super::processor::TenantSpanProcessor;

/// Errors raised while bootstrapping or tearing down telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to build the OTLP exporter.
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] ExporterBuildError),

    /// Failed to install the tracing subscriber.
    #[error("failed to initialize tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    /// Failed to install the Prometheus recorder.
    #[error("failed to install Prometheus exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// The span pipeline failed to flush or shut down.
    #[error("span pipeline error: {0}")]
    Tracer(#[from] OTelSdkError),
}

/// Owns the telemetry providers for the process.
///
/// Constructed once by the entry point and carried until exit. Dropping
/// without calling [`Telemetry::shutdown`] loses spans still sitting in
/// the batch queue.
pub struct Telemetry {
    tracer_provider: Option<SdkTracerProvider>,
    _log_guard: Option<WorkerGuard>,
}

impl Telemetry {
    /// Builds the span pipeline, installs the logging subscriber, and
    /// starts the Prometheus exporter, per the enabled config sections.
    ///
    /// # Errors
    ///
    /// Returns an error when the OTLP exporter cannot be built, a global
    /// subscriber or recorder is already installed, or the metrics
    /// listener cannot start.
    pub fn init(config: &ObservabilityConfig) -> Result<Self, TelemetryError> {
        let tracer_provider = config
            .otel
            .as_ref()
            .map(|otel| build_tracer_provider(&config.service_name, otel))
            .transpose()?;

        let log_guard = init_logging(&config.log, tracer_provider.as_ref())?;

        if let Some(prometheus) = &config.prometheus {
            init_metrics(prometheus)?;
        }

        Ok(Self {
            tracer_provider,
            _log_guard: log_guard,
        })
    }

    /// Borrow of the tracer provider, for callers that need to hand spans
    /// to additional instrumentation.
    #[must_use]
    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    /// Blocks until queued spans are handed to the exporter.
    ///
    /// # Errors
    ///
    /// Propagates the export pipeline's flush failure verbatim.
    pub fn force_flush(&self) -> Result<(), TelemetryError> {
        if let Some(provider) = &self.tracer_provider {
            provider.force_flush()?;
        }
        Ok(())
    }

    /// Flushes and shuts the span pipeline down.
    ///
    /// # Errors
    ///
    /// Propagates the export pipeline's shutdown failure verbatim.
    pub fn shutdown(mut self) -> Result<(), TelemetryError> {
        if let Some(provider) = self.tracer_provider.take() {
            provider.shutdown()?;
        }
        Ok(())
    }
}

/// Assembles exporter -> batch processor -> tenant decorator -> provider.
fn build_tracer_provider(
    service_name: &str,
    config: &OtelConfig,
) -> Result<SdkTracerProvider, ExporterBuildError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .build()?;

    let resource = Resource::builder()
        .with_attribute(KeyValue::new(
            opentelemetry_semantic_conventions::resource::SERVICE_NAME,
            service_name.to_string(),
        ))
        .build();

    let batch = BatchSpanProcessor::builder(exporter).build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(Sampler::TraceIdRatioBased(config.sample_ratio))
        .with_span_processor(TenantSpanProcessor::new(batch))
        .build())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Building the exporter is lazy: no collector needs to be listening.
    #[tokio::test]
    async fn builds_provider_without_a_collector() {
        let provider = build_tracer_provider("beacon-test", &OtelConfig::default()).unwrap();
        // No spans were recorded, so shutdown has nothing to export.
        provider.shutdown().unwrap();
    }

    #[test]
    fn shutdown_with_tracing_disabled_is_a_no_op() {
        let telemetry = Telemetry {
            tracer_provider: None,
            _log_guard: None,
        };
        telemetry.shutdown().unwrap();
    }

    #[test]
    fn force_flush_with_tracing_disabled_is_a_no_op() {
        let telemetry = Telemetry {
            tracer_provider: None,
            _log_guard: None,
        };
        telemetry.force_flush().unwrap();
    }
}
