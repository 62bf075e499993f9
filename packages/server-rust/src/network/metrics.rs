//! HTTP metrics middleware.
//!
//! Records request count and duration through the `metrics` facade; the
//! Prometheus recorder installed at startup exposes them for scraping.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};
use std::time::Instant;

use http::{Request, Response};
use metrics::{counter, histogram};
use tower::{Layer, Service};

/// Tower layer that instruments requests with count and duration metrics.
#[derive(Debug, Clone, Default)]
pub struct HttpMetricsLayer;

impl<S> Layer<S> for HttpMetricsLayer {
    type Service = HttpMetricsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpMetricsService { inner }
    }
}

/// Service wrapper that records per-request metrics.
#[derive(Debug, Clone)]
pub struct HttpMetricsService<S> {
    inner: S,
}

impl<S, ReqBody, RspBody> Service<Request<ReqBody>> for HttpMetricsService<S>
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
        let method = req.method().as_str().to_string();
        let fut = self.inner.call(req);

        Box::pin(async move {
            let start = Instant::now();
            let result = fut.await;

            let status = match &result {
                Ok(rsp) => rsp.status().as_u16().to_string(),
                Err(_) => "error".to_string(),
            };
            counter!("http_requests_total", "method" => method.clone(), "status" => status)
                .increment(1);
            histogram!("http_request_duration_seconds", "method" => method)
                .record(start.elapsed().as_secs_f64());

            result
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
