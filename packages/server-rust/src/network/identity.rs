//! Identity seeding middleware.
//!
//! Binds inbound identity headers into the request's metadata context so
//! downstream stages (handlers, span enrichment) all read one canonical
//! carrier. Runs on the request path, before the handler. A context placed
//! in the request extensions by an earlier layer (e.g. token auth) keeps
//! its bindings; headers only fill keys the context does not carry yet.

use std::task::{Context as TaskContext, Poll};

use beacon_core::{keys, metainfo, Context};
use http::Request;
use tower::{Layer, Service};
use tracing::debug;

use super::client_ip::client_ip;

/// Header-to-key mapping seeded into the metadata context.
const IDENTITY_HEADERS: &[(&str, &str)] = &[
    ("x-tenant-id", keys::TENANT_ID),
    ("x-merchant-id", keys::MERCHANT_ID),
    ("x-user-id", keys::USER_ID),
    ("x-request-id", keys::REQUEST_ID),
];

/// Tower layer that seeds each request's metadata context from identity
/// headers.
#[derive(Debug, Clone, Default)]
pub struct IdentityContextLayer;

impl<S> Layer<S> for IdentityContextLayer {
    type Service = IdentityContextService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityContextService { inner }
    }
}

/// Service wrapper that populates the request's metadata context.
#[derive(Debug, Clone)]
pub struct IdentityContextService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for IdentityContextService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let mut cx = req
            .extensions()
            .get::<Context>()
            .cloned()
            .unwrap_or_else(Context::new);

        for &(header, key) in IDENTITY_HEADERS {
            if metainfo::has(&cx, key) {
                continue;
            }
            if let Some(value) = req.headers().get(header).and_then(|v| v.to_str().ok()) {
                cx = metainfo::set(&cx, key, value);
            }
        }

        if let Some(ip) = client_ip(req.headers(), None) {
            debug!(
                client_ip = %ip,
                request_id = metainfo::request_id(&cx),
                "request identity seeded"
            );
        }

        req.extensions_mut().insert(cx);
        self.inner.call(req)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::future::{ready, Ready};
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use http::Response;
    use tower::ServiceExt;

    use super::*;

    /// Stub service that captures the metadata context it was called with.
    #[derive(Clone, Default)]
    struct CaptureService {
        seen: Arc<Mutex<Option<Context>>>,
    }

    impl Service<Request<Body>> for CaptureService {
        type Response = Response<Body>;
        type Error = Infallible;
        type Future = Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            *self.seen.lock().unwrap() = req.extensions().get::<Context>().cloned();
            ready(Ok(Response::new(Body::empty())))
        }
    }

    #[tokio::test]
    async fn seeds_context_from_identity_headers() {
        let capture = CaptureService::default();
        let svc = IdentityContextLayer.layer(capture.clone());

        let req = Request::builder()
            .header("x-tenant-id", "t1")
            .header("x-user-id", "u1")
            .header("x-request-id", "req-1")
            .body(Body::empty())
            .unwrap();
        svc.oneshot(req).await.unwrap();

        let cx = capture.seen.lock().unwrap().clone().unwrap();
        assert_eq!(metainfo::tenant_id(&cx), "t1");
        assert_eq!(metainfo::user_id(&cx), "u1");
        assert_eq!(metainfo::request_id(&cx), "req-1");
        assert!(!metainfo::has(&cx, keys::MERCHANT_ID));
    }

    #[tokio::test]
    async fn existing_context_bindings_win_over_headers() {
        let capture = CaptureService::default();
        let svc = IdentityContextLayer.layer(capture.clone());

        let upstream = metainfo::set(&Context::new(), keys::TENANT_ID, "from_auth");
        let mut req = Request::builder()
            .header("x-tenant-id", "from_header")
            .header("x-merchant-id", "m1")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(upstream);
        svc.oneshot(req).await.unwrap();

        let cx = capture.seen.lock().unwrap().clone().unwrap();
        assert_eq!(metainfo::tenant_id(&cx), "from_auth");
        assert_eq!(metainfo::merchant_id(&cx), "m1");
    }

    #[tokio::test]
    async fn no_headers_still_inserts_an_empty_context() {
        let capture = CaptureService::default();
        let svc = IdentityContextLayer.layer(capture.clone());

        svc.oneshot(Request::new(Body::empty())).await.unwrap();

        let cx = capture.seen.lock().unwrap().clone();
        let cx = cx.expect("context inserted even without identity headers");
        assert!(!metainfo::has(&cx, keys::TENANT_ID));
        assert!(!metainfo::has(&cx, keys::REQUEST_ID));
    }
}
