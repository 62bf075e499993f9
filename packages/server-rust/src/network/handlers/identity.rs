//! Request identity echo endpoint.

use axum::{Extension, Json};
use beacon_core::{metainfo, Context, ContextInfo};

/// Returns the identity snapshot of the calling request.
///
/// Reads the metadata context seeded by the identity middleware. With no
/// context present the snapshot has all fields empty; that is an answer,
/// not an error.
pub async fn whoami_handler(cx: Option<Extension<Context>>) -> Json<ContextInfo> {
    let info = cx
        .map(|Extension(cx)| metainfo::context_info(&cx))
        .unwrap_or_default();
    Json(info)
}

#[cfg(test)]
mod tests {
    use beacon_core::keys;

    use super::*;

    #[tokio::test]
    async fn echoes_the_seeded_identity() {
        let cx = metainfo::set_many(
            &Context::new(),
            [(keys::TENANT_ID, "t1"), (keys::REQUEST_ID, "req-1")],
        );

        let Json(info) = whoami_handler(Some(Extension(cx))).await;
        assert_eq!(info.tenant_id, "t1");
        assert_eq!(info.request_id, "req-1");
        assert_eq!(info.user_id, "");
        assert_eq!(info.merchant_id, "");
    }

    #[tokio::test]
    async fn missing_context_yields_empty_snapshot() {
        let Json(info) = whoami_handler(None).await;
        assert_eq!(info, ContextInfo::default());
    }
}
