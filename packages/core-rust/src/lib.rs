//! Beacon Core — request metadata carrier, identity snapshot, and canonical keys.

pub mod context;
pub mod keys;
pub mod metainfo;

pub use context::ContextInfo;
pub use opentelemetry::Context;
