//! Tenant-aware span processor decorator.
//!
//! Wraps the export pipeline and copies request identity from the metadata
//! carrier onto every span as it starts. Export, batching, and retry stay
//! entirely with the wrapped processor: every call is forwarded unchanged
//! and wrapped-processor failures propagate verbatim.

use std::time::Duration;

use beacon_core::{keys, metainfo};
use opentelemetry::trace::Span as _;
use opentelemetry::{Context, KeyValue};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{Span, SpanData, SpanProcessor};
use opentelemetry_sdk::Resource;

use super::{MERCHANT_ID_ATTR, TENANT_ID_ATTR, USER_ID_ATTR};

/// Decorator around a [`SpanProcessor`] that stamps tenant, merchant, and
/// user attributes onto spans at start time, from whatever metadata the
/// span's context carried when it was created.
///
/// Identity bound later in the request (e.g. by business logic) is out of
/// reach here; the post-handler middleware covers those values.
#[derive(Debug)]
pub struct TenantSpanProcessor<P> {
    inner: P,
}

impl<P> TenantSpanProcessor<P> {
    /// Wraps `inner`, which keeps full ownership of export behavior.
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: SpanProcessor> SpanProcessor for TenantSpanProcessor<P> {
    fn on_start(&self, span: &mut Span, cx: &Context) {
        for (attr, key, aliases) in [
            (TENANT_ID_ATTR, keys::TENANT_ID, keys::TENANT_ID_ALIASES),
            (MERCHANT_ID_ATTR, keys::MERCHANT_ID, keys::MERCHANT_ID_ALIASES),
            (USER_ID_ATTR, keys::USER_ID, keys::USER_ID_ALIASES),
        ] {
            let value = metainfo::get_with_fallback(cx, key, aliases);
            if !value.is_empty() {
                span.set_attribute(KeyValue::new(attr, value.to_string()));
            }
        }
        self.inner.on_start(span, cx);
    }

    fn on_end(&self, span: SpanData) {
        self.inner.on_end(span);
    }

    fn force_flush(&self) -> OTelSdkResult {
        self.inner.force_flush()
    }

    fn shutdown(&self) -> OTelSdkResult {
        self.inner.shutdown()
    }

    fn shutdown_with_timeout(&self, timeout: Duration) -> OTelSdkResult {
        self.inner.shutdown_with_timeout(timeout)
    }

    fn set_resource(&mut self, resource: &Resource) {
        self.inner.set_resource(resource);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
