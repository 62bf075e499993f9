//! Canonical request-metadata keys and their fallback aliases.
//!
//! These constants are the shared contract between identity producers
//! (auth middleware, upstream services) and identity consumers (span
//! enrichment, request handlers). Producers that predate the canonical
//! uppercase form may still send the lowercase aliases; fallback-aware
//! lookups consult them in the declared order.

/// Tenant identifier, canonical form.
pub const TENANT_ID: &str = "TENANT_ID";

/// Aliases consulted when [`TENANT_ID`] is unbound, highest priority first.
pub const TENANT_ID_ALIASES: &[&str] = &["tenant_id", "tenant"];

/// Merchant identifier, canonical form.
pub const MERCHANT_ID: &str = "MERCHANT_ID";

/// Aliases consulted when [`MERCHANT_ID`] is unbound.
pub const MERCHANT_ID_ALIASES: &[&str] = &["merchant_id", "merchant"];

/// End-user identifier, canonical form.
pub const USER_ID: &str = "USER_ID";

/// Aliases consulted when [`USER_ID`] is unbound.
pub const USER_ID_ALIASES: &[&str] = &["user_id", "user"];

/// Request correlation identifier, canonical form.
pub const REQUEST_ID: &str = "REQUEST_ID";

/// Aliases consulted when [`REQUEST_ID`] is unbound.
pub const REQUEST_ID_ALIASES: &[&str] = &["request_id", "x-request-id"];

/// The well-known identity keys, in the order they are mirrored by
/// [`crate::metainfo::copy_identity`] and reported by
/// [`crate::metainfo::get_all`].
pub const IDENTITY_KEYS: &[&str] = &[TENANT_ID, MERCHANT_ID, USER_ID, REQUEST_ID];
