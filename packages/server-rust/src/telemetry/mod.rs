//! Telemetry bootstrap: span pipeline, logging, and metrics.
//!
//! The tracer provider is an explicitly constructed object owned by the
//! process entry point and injected where it is needed; nothing in this
//! module registers or reads a process-global provider.

pub mod config;
pub mod init;
pub mod logging;
pub mod metrics;
pub mod processor;

pub use config::{
    LogConfig, LogFileConfig, LogRotation, ObservabilityConfig, OtelConfig, PrometheusConfig,
};
pub use init::{Telemetry, TelemetryError};
pub use processor::TenantSpanProcessor;

/// Span attribute carrying the resolved tenant id.
pub const TENANT_ID_ATTR: &str = "tenant.id";

/// Span attribute flagging a request that resolved no tenant identity.
pub const TENANT_ID_STATUS_ATTR: &str = "tenant.id.status";

/// Span attribute carrying the resolved merchant id.
pub const MERCHANT_ID_ATTR: &str = "merchant.id";

/// Span attribute flagging a request that resolved no merchant identity.
pub const MERCHANT_ID_STATUS_ATTR: &str = "merchant.id.status";

/// Span attribute carrying the resolved user id.
pub const USER_ID_ATTR: &str = "user.id";

/// Value of the status attributes when identity is absent or empty.
pub const IDENTITY_MISSING: &str = "missing";
