use serde::{Deserialize, Serialize};

/// Per-request identity snapshot materialized from the metadata carrier.
/// Read-only; a field is the empty string when its key is unbound. Built on
/// demand by [`crate::metainfo::context_info`] and has no lifecycle of its
/// own beyond the call that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    /// Tenant scope for multi-tenant isolation.
    pub tenant_id: String,
    /// Merchant under the tenant, for merchant-scoped requests.
    pub merchant_id: String,
    /// Authenticated end user, if the request is authenticated.
    pub user_id: String,
    /// Correlation identifier assigned at the edge.
    pub request_id: String,
}
