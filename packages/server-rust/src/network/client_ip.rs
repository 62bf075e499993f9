//! Client address resolution behind proxies.

use std::net::SocketAddr;

use http::HeaderMap;

/// Resolves the client IP address for a request.
///
/// Proxy headers are consulted first: `X-Forwarded-For` (first hop, the
/// original client), then `X-Real-IP`, then `X-Forwarded`. Without any of
/// those, falls back to the peer address of the connection when one is
/// known.
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    if let Some(forwarded_for) = header_str(headers, "x-forwarded-for") {
        if let Some(first) = forwarded_for.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    for name in ["x-real-ip", "x-forwarded"] {
        if let Some(value) = header_str(headers, name) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
