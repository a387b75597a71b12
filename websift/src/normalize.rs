//! URL normalization for links scraped from result pages.
//!
//! DuckDuckGo wraps results as `/l/?uddg=<target>&rut=...` and Yahoo as
//! `.../RU=<target>/RK=2/RS=...`. Both are unwrapped here and the result is
//! percent-decoded.

use dashmap::DashMap;
use std::sync::LazyLock;

/// Number of entries after which the normalization cache is reset.
pub const NORMALIZE_CACHE_CAPACITY: usize = 4096;

static CACHE: LazyLock<DashMap<String, String>> = LazyLock::new(DashMap::new);

/// Normalizes a raw result link.
///
/// Results are memoized process-wide; the cache only ever maps an input to its
/// own deterministic output.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if let Some(hit) = CACHE.get(raw) {
        return hit.value().clone();
    }

    let normalized = normalize_uncached(raw);

    if CACHE.len() >= NORMALIZE_CACHE_CAPACITY {
        CACHE.clear();
    }
    CACHE.insert(raw.to_string(), normalized.clone());
    normalized
}

fn normalize_uncached(raw: &str) -> String {
    let mut url = raw;

    if url.contains("uddg=http") {
        if let Some((_, rest)) = url.split_once("uddg=") {
            url = rest.split_once("&rut=").map_or(rest, |(head, _)| head);
        }
    }

    if url.contains("/RU=http") {
        if let Some((_, rest)) = url.split_once("/RU=") {
            url = rest.split_once("/RK=2/RS=").map_or(rest, |(head, _)| head);
        }
    }

    let plussed = url.replace(' ', "+");
    let decoded = urlencoding::decode_binary(plussed.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Number of entries currently cached.
#[must_use]
pub fn cache_len() -> usize {
    CACHE.len()
}
