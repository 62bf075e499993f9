//! Logging subscriber installation.
//!
//! Console `fmt` output plus an optional JSON rolling file, with spans
//! bridged into the OpenTelemetry pipeline when trace export is enabled.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use super::config::{LogConfig, LogRotation};
use super::init::TelemetryError;

/// Installs the global tracing subscriber.
///
/// Returns the file writer's guard when a log file is configured; the
/// guard must stay alive for the process lifetime or buffered lines are
/// lost on exit.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(
    config: &LogConfig,
    tracer_provider: Option<&SdkTracerProvider>,
) -> Result<Option<WorkerGuard>, TelemetryError> {
    let filter = env_filter(&config.level);

    let (file_layer, guard) = match &config.file {
        Some(file) => {
            let appender = match file.rotation {
                LogRotation::Hourly => {
                    tracing_appender::rolling::hourly(&file.directory, &file.file_name)
                }
                LogRotation::Daily => {
                    tracing_appender::rolling::daily(&file.directory, &file.file_name)
                }
                LogRotation::Never => {
                    tracing_appender::rolling::never(&file.directory, &file.file_name)
                }
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let otel_layer = tracer_provider
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer("beacon")));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(guard)
}

/// `RUST_LOG` wins over the configured default level.
///
/// The exporter's own gRPC stack is silenced: its requests would otherwise
/// generate spans that feed back into the exporter.
fn env_filter(default_level: &str) -> EnvFilter {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    ["opentelemetry=off", "hyper=off", "tonic=off", "h2=off"]
        .iter()
        .fold(filter, |filter, directive| {
            filter.add_directive(directive.parse().expect("static directive parses"))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
