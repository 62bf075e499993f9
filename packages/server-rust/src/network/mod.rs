//! Networking: HTTP server lifecycle, middleware stack, and handlers.

pub mod client_ip;
pub mod config;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod module;
pub mod shutdown;
pub mod span_identity;

pub use client_ip::client_ip;
pub use config::*;
pub use handlers::AppState;
pub use identity::IdentityContextLayer;
pub use metrics::HttpMetricsLayer;
pub use module::NetworkModule;
pub use shutdown::*;
pub use span_identity::SpanIdentityLayer;
