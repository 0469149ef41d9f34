//! HTTP cache control module
//!
//! `ETag` generation, `If-None-Match` matching and `Cache-Control` values.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Generate a strong `ETag` from content
///
/// Returns a quoted string such as `"9b1a2f0c"`, stable for identical input.
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.len().hash(&mut hasher);
    content.hash(&mut hasher);
    format!("\"{:x}\"", hasher.finish())
}

/// Check whether `If-None-Match` matches the server's `ETag`
///
/// Accepts a single tag, a comma separated list, weak tags (`W/"..."`) and `*`.
/// A match means the client copy is current and a 304 should be sent.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let Some(header) = if_none_match else {
        return false;
    };
    header.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

/// `Cache-Control` value for a publicly cacheable asset
pub fn public_cache_control(max_age: u32) -> String {
    format!("public, max-age={max_age}")
}
