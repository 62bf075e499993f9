//! Post-handler span identity middleware.
//!
//! Registered innermost in the middleware stack, so its post-completion
//! step runs right after the business handler and observes the final
//! request identity, including values bound mid-request. Identity already
//! known at span start is covered by the processor decorator; this stage
//! covers everything that wasn't.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use beacon_core::{keys, metainfo, Context};
use http::{Request, Response};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::KeyValue;
use tower::{Layer, Service};

use crate::telemetry::{
    IDENTITY_MISSING, MERCHANT_ID_ATTR, MERCHANT_ID_STATUS_ATTR, TENANT_ID_ATTR,
    TENANT_ID_STATUS_ATTR, USER_ID_ATTR,
};

/// Tower layer that annotates the active span with final request identity.
#[derive(Debug, Clone, Default)]
pub struct SpanIdentityLayer;

impl<S> Layer<S> for SpanIdentityLayer {
    type Service = SpanIdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SpanIdentityService { inner }
    }
}

/// Service wrapper implementing the post-handler annotation step.
#[derive(Debug, Clone)]
pub struct SpanIdentityService<S> {
    inner: S,
}

impl<S, ReqBody, RspBody> Service<Request<ReqBody>> for SpanIdentityService<S>
where
    S: Service<Request<ReqBody>, Response = Response<RspBody>> + Send,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let request_cx = req.extensions().get::<Context>().cloned();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let result = fut.await;

            // Handlers that mutate identity mid-request publish the derived
            // context through the response extensions; it wins over the
            // request-time snapshot. Annotation still runs when downstream
            // erred (e.g. the client went away): whatever span state exists
            // gets whatever identity was resolved.
            let cx = match &result {
                Ok(rsp) => rsp
                    .extensions()
                    .get::<Context>()
                    .cloned()
                    .or(request_cx)
                    .unwrap_or_else(Context::current),
                Err(_) => request_cx.unwrap_or_else(Context::current),
            };

            annotate_span(&cx);
            result
        })
    }
}

/// Writes the identity attributes onto the context's active span.
///
/// Absent or invalid span: nothing to annotate, skip silently. Tenant and
/// merchant get a `*.status = "missing"` marker when their value is empty,
/// so absence is queryable in the trace backend; `user.id` is always
/// written, empty or not.
fn annotate_span(cx: &Context) {
    let span = cx.span();
    if !span.span_context().is_valid() {
        return;
    }

    let tenant = metainfo::get_with_fallback(cx, keys::TENANT_ID, keys::TENANT_ID_ALIASES);
    if tenant.is_empty() {
        span.set_attribute(KeyValue::new(TENANT_ID_STATUS_ATTR, IDENTITY_MISSING));
    } else {
        span.set_attribute(KeyValue::new(TENANT_ID_ATTR, tenant.to_string()));
    }

    let merchant = metainfo::get_with_fallback(cx, keys::MERCHANT_ID, keys::MERCHANT_ID_ALIASES);
    if merchant.is_empty() {
        span.set_attribute(KeyValue::new(MERCHANT_ID_STATUS_ATTR, IDENTITY_MISSING));
    } else {
        span.set_attribute(KeyValue::new(MERCHANT_ID_ATTR, merchant.to_string()));
    }

    let user = metainfo::get_with_fallback(cx, keys::USER_ID, keys::USER_ID_ALIASES);
    span.set_attribute(KeyValue::new(USER_ID_ATTR, user.to_string()));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::future::{ready, Ready};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::Body;
    use opentelemetry::trace::{Tracer as _, TracerProvider as _};
    use opentelemetry_sdk::error::OTelSdkResult;
    use opentelemetry_sdk::trace::{SdkTracerProvider, Span, SpanData, SpanProcessor};
    use tower::ServiceExt;

    use super::*;

    /// Stub processor capturing ended spans for assertion.
    #[derive(Debug, Clone, Default)]
    struct RecordingProcessor {
        ended: Arc<Mutex<Vec<SpanData>>>,
    }

    impl SpanProcessor for RecordingProcessor {
        fn on_start(&self, _span: &mut Span, _cx: &Context) {}

        fn on_end(&self, span: SpanData) {
            self.ended.lock().unwrap().push(span);
        }

        fn force_flush(&self) -> OTelSdkResult {
            Ok(())
        }

        fn shutdown(&self) -> OTelSdkResult {
            Ok(())
        }

        fn shutdown_with_timeout(&self, _timeout: Duration) -> OTelSdkResult {
            Ok(())
        }
    }

    /// Stub service that answers with an empty 200.
    #[derive(Clone)]
    struct OkService;

    impl<B> Service<Request<B>> for OkService {
        type Response = Response<Body>;
        type Error = Infallible;
        type Future = Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<B>) -> Self::Future {
            ready(Ok(Response::new(Body::empty())))
        }
    }

    /// Stub service that publishes a mutated context via the response
    /// extensions, the way a handler that resolves identity mid-request
    /// would.
    #[derive(Clone)]
    struct MutatingService {
        publish: Context,
    }

    impl<B> Service<Request<B>> for MutatingService {
        type Response = Response<Body>;
        type Error = Infallible;
        type Future = Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<B>) -> Self::Future {
            let mut rsp = Response::new(Body::empty());
            rsp.extensions_mut().insert(self.publish.clone());
            ready(Ok(rsp))
        }
    }

    fn recording_provider() -> (SdkTracerProvider, RecordingProcessor) {
        let recorder = RecordingProcessor::default();
        let provider = SdkTracerProvider::builder()
            .with_span_processor(recorder.clone())
            .build();
        (provider, recorder)
    }

    /// Starts a span and returns a context carrying it.
    fn context_with_span(provider: &SdkTracerProvider) -> Context {
        let span = provider.tracer("test").start("request");
        Context::new().with_span(span)
    }

    fn request_with(cx: Context) -> Request<Body> {
        let mut req = Request::new(Body::empty());
        req.extensions_mut().insert(cx);
        req
    }

    fn attr_value(span: &SpanData, key: &str) -> Option<String> {
        span.attributes
            .iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str().into_owned())
    }

    fn single_ended_span(recorder: &RecordingProcessor) -> SpanData {
        let ended = recorder.ended.lock().unwrap();
        assert_eq!(ended.len(), 1);
        ended[0].clone()
    }

    #[tokio::test]
    async fn annotates_span_with_resolved_identity() {
        let (provider, recorder) = recording_provider();
        let cx = context_with_span(&provider);
        let cx = metainfo::set_many(
            &cx,
            [
                (keys::TENANT_ID, "t1"),
                (keys::MERCHANT_ID, "m1"),
                (keys::USER_ID, "u1"),
            ],
        );

        let svc = SpanIdentityLayer.layer(OkService);
        svc.oneshot(request_with(cx.clone())).await.unwrap();
        cx.span().end();

        let span = single_ended_span(&recorder);
        assert_eq!(attr_value(&span, TENANT_ID_ATTR).as_deref(), Some("t1"));
        assert_eq!(attr_value(&span, MERCHANT_ID_ATTR).as_deref(), Some("m1"));
        assert_eq!(attr_value(&span, USER_ID_ATTR).as_deref(), Some("u1"));
        assert_eq!(attr_value(&span, TENANT_ID_STATUS_ATTR), None);
        assert_eq!(attr_value(&span, MERCHANT_ID_STATUS_ATTR), None);
    }

    #[tokio::test]
    async fn empty_tenant_and_merchant_get_missing_markers() {
        let (provider, recorder) = recording_provider();
        let cx = context_with_span(&provider);
        // Bound-but-empty tenant: the non-empty check, not the bound check,
        // gates the attribute choice.
        let cx = metainfo::set(&cx, keys::TENANT_ID, "");

        let svc = SpanIdentityLayer.layer(OkService);
        svc.oneshot(request_with(cx.clone())).await.unwrap();
        cx.span().end();

        let span = single_ended_span(&recorder);
        assert_eq!(attr_value(&span, TENANT_ID_ATTR), None);
        assert_eq!(
            attr_value(&span, TENANT_ID_STATUS_ATTR).as_deref(),
            Some(IDENTITY_MISSING)
        );
        assert_eq!(
            attr_value(&span, MERCHANT_ID_STATUS_ATTR).as_deref(),
            Some(IDENTITY_MISSING)
        );
    }

    #[tokio::test]
    async fn empty_user_is_still_written() {
        let (provider, recorder) = recording_provider();
        let cx = context_with_span(&provider);
        let cx = metainfo::set(&cx, keys::USER_ID, "");

        let svc = SpanIdentityLayer.layer(OkService);
        svc.oneshot(request_with(cx.clone())).await.unwrap();
        cx.span().end();

        let span = single_ended_span(&recorder);
        assert_eq!(attr_value(&span, USER_ID_ATTR).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn no_span_in_context_is_a_silent_no_op() {
        let (_provider, recorder) = recording_provider();
        let cx = metainfo::set(&Context::new(), keys::TENANT_ID, "t1");

        let svc = SpanIdentityLayer.layer(OkService);
        let rsp = svc.oneshot(request_with(cx)).await.unwrap();

        assert_eq!(rsp.status(), http::StatusCode::OK);
        assert!(recorder.ended.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_context_at_all_is_a_silent_no_op() {
        let svc = SpanIdentityLayer.layer(OkService);
        let rsp = svc.oneshot(Request::new(Body::empty())).await.unwrap();
        assert_eq!(rsp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn context_published_by_the_handler_wins() {
        let (provider, recorder) = recording_provider();
        let cx = context_with_span(&provider);
        let request_cx = metainfo::set(&cx, keys::TENANT_ID, "before");
        // Identity resolved mid-request, carried on the same span.
        let handler_cx = metainfo::set(&cx, keys::TENANT_ID, "after");

        let svc = SpanIdentityLayer.layer(MutatingService {
            publish: handler_cx,
        });
        svc.oneshot(request_with(request_cx)).await.unwrap();
        cx.span().end();

        let span = single_ended_span(&recorder);
        assert_eq!(attr_value(&span, TENANT_ID_ATTR).as_deref(), Some("after"));
    }
}
