//! HTTP handler definitions for the Beacon server.
//!
//! This module defines `AppState` (the shared state carried through axum
//! extractors) and re-exports all handler functions for convenient access
//! when building the router.

pub mod health;
pub mod identity;

pub use health::{health_handler, liveness_handler, readiness_handler};
pub use identity::whoami_handler;

use std::sync::Arc;
use std::time::Instant;

use super::{NetworkConfig, ShutdownController};

/// Shared application state passed to all axum handlers via `State` extraction.
///
/// Holds `Arc` references to shared resources so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Graceful shutdown controller with health state.
    pub shutdown: Arc<ShutdownController>,
    /// Network configuration (bind address, TLS, CORS).
    pub config: Arc<NetworkConfig>,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
