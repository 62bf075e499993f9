//! Request-scoped metadata carrier.
//!
//! Layers a copy-on-write string map onto [`opentelemetry::Context`]. Every
//! write derives a new context and leaves the original untouched, matching
//! the derived-copy semantics of context propagation. All operations are
//! total: reading an unbound key yields an empty value, never an error, and
//! none of them perform I/O.
//!
//! An empty-string value is a real binding ("set but empty") and is
//! observable through [`has`]; it is distinct from an absent key.

use std::collections::HashMap;
use std::sync::Arc;

use opentelemetry::Context;

use crate::context::ContextInfo;
use crate::keys;

/// Carrier payload stored inside the context. The `Arc` keeps context
/// derivation cheap when the map is only read.
#[derive(Debug, Clone, Default)]
struct Metadata(Arc<HashMap<String, String>>);

fn map_of(cx: &Context) -> Option<&HashMap<String, String>> {
    cx.get::<Metadata>().map(|m| m.0.as_ref())
}

/// Returns a derived context with `key` bound to `value`.
#[must_use]
pub fn set(cx: &Context, key: impl Into<String>, value: impl Into<String>) -> Context {
    let mut map = map_of(cx).cloned().unwrap_or_default();
    map.insert(key.into(), value.into());
    cx.with_value(Metadata(Arc::new(map)))
}

/// Returns a derived context with every entry bound. Keys are independent,
/// so application order is unobservable.
#[must_use]
pub fn set_many<K, V>(cx: &Context, entries: impl IntoIterator<Item = (K, V)>) -> Context
where
    K: Into<String>,
    V: Into<String>,
{
    let mut map = map_of(cx).cloned().unwrap_or_default();
    for (key, value) in entries {
        map.insert(key.into(), value.into());
    }
    cx.with_value(Metadata(Arc::new(map)))
}

/// Returns the value bound to `key`, or `""` when unbound.
#[must_use]
pub fn get<'a>(cx: &'a Context, key: &str) -> &'a str {
    map_of(cx)
        .and_then(|m| m.get(key))
        .map_or("", String::as_str)
}

/// Returns the value of the first *bound* key among `primary` then
/// `fallbacks`, in declared order.
///
/// Being bound is what ends the search: a bound-but-empty key wins over a
/// later non-empty alias.
#[must_use]
pub fn get_with_fallback<'a>(cx: &'a Context, primary: &str, fallbacks: &[&str]) -> &'a str {
    let Some(map) = map_of(cx) else { return "" };
    std::iter::once(primary)
        .chain(fallbacks.iter().copied())
        .find_map(|key| map.get(key))
        .map_or("", String::as_str)
}

/// True iff `key` is bound, regardless of its value.
#[must_use]
pub fn has(cx: &Context, key: &str) -> bool {
    map_of(cx).is_some_and(|m| m.contains_key(key))
}

/// Returns the bound value, or `default` only when `key` is unbound.
#[must_use]
pub fn get_or<'a>(cx: &'a Context, key: &str, default: &'a str) -> &'a str {
    map_of(cx)
        .and_then(|m| m.get(key))
        .map_or(default, String::as_str)
}

/// Mirrors the identity keys from `source` onto `target`, returning the
/// derived target context.
///
/// Keys bound in `source` overwrite the target's bindings; keys unbound in
/// `source` are cleared, so the identity snapshot of the result always
/// equals the source's. Keys outside [`keys::IDENTITY_KEYS`] are not copied
/// and the target's own extra bindings are left untouched.
#[must_use]
pub fn copy_identity(source: &Context, target: &Context) -> Context {
    let src = map_of(source);
    let mut map = map_of(target).cloned().unwrap_or_default();
    for &key in keys::IDENTITY_KEYS {
        match src.and_then(|m| m.get(key)) {
            Some(value) => {
                map.insert(key.to_string(), value.clone());
            }
            None => {
                map.remove(key);
            }
        }
    }
    target.with_value(Metadata(Arc::new(map)))
}

/// Snapshot of the currently bound identity keys.
///
/// Arbitrary keys set through [`set`] stay readable through [`get`] but are
/// not part of the identity snapshot.
#[must_use]
pub fn get_all(cx: &Context) -> HashMap<String, String> {
    let mut all = HashMap::new();
    if let Some(map) = map_of(cx) {
        for &key in keys::IDENTITY_KEYS {
            if let Some(value) = map.get(key) {
                all.insert(key.to_string(), value.clone());
            }
        }
    }
    all
}

/// Builds the identity snapshot in one call. Plain lookups, no aliases.
#[must_use]
pub fn context_info(cx: &Context) -> ContextInfo {
    ContextInfo {
        tenant_id: get(cx, keys::TENANT_ID).to_string(),
        merchant_id: get(cx, keys::MERCHANT_ID).to_string(),
        user_id: get(cx, keys::USER_ID).to_string(),
        request_id: get(cx, keys::REQUEST_ID).to_string(),
    }
}

/// Bound tenant id, or `""`. No alias resolution.
#[must_use]
pub fn tenant_id(cx: &Context) -> &str {
    get(cx, keys::TENANT_ID)
}

/// Bound merchant id, or `""`. No alias resolution.
#[must_use]
pub fn merchant_id(cx: &Context) -> &str {
    get(cx, keys::MERCHANT_ID)
}

/// Bound user id, or `""`. No alias resolution.
#[must_use]
pub fn user_id(cx: &Context) -> &str {
    get(cx, keys::USER_ID)
}

/// Bound request id, or `""`. No alias resolution.
#[must_use]
pub fn request_id(cx: &Context) -> &str {
    get(cx, keys::REQUEST_ID)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
