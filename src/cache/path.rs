//! URL to cache path encoding
//!
//! Mirrors the Coursier cache layout: `https://host/a/b.jar` lives at
//! `https/host/a/b.jar` relative to the cache root. Host and path are kept
//! verbatim (case preserved, no percent-decoding).

use crate::error::{SquishError, SquishResult};
use std::path::PathBuf;

/// Separator between scheme and authority in an artifact URL
pub const SCHEME_SEPARATOR: &str = "://";

/// Encode an artifact URL into its path relative to the cache root
///
/// Only URLs whose layout is unambiguous are accepted: anything the
/// filesystem would fold (empty, `.` or `..` segments) or that has no
/// defined layout (query strings, fragments) is rejected, which keeps the
/// encoding injective.
pub fn encode(url: &str) -> SquishResult<PathBuf> {
    let segments = segments(url)?;
    Ok(segments.iter().collect())
}

/// Split a URL into the cache path components `[scheme, host, path...]`
pub fn segments(url: &str) -> SquishResult<Vec<&str>> {
    let reject = |reason: &str| SquishError::unsupported_url(url, reason);

    let (scheme, rest) = url
        .split_once(SCHEME_SEPARATOR)
        .ok_or_else(|| reject("missing scheme separator"))?;

    if !is_valid_scheme(scheme) {
        return Err(reject("invalid scheme"));
    }
    if rest.contains('?') {
        return Err(reject("query strings have no cache layout"));
    }
    if rest.contains('#') {
        return Err(reject("fragments have no cache layout"));
    }
    if rest.contains('\\') || rest.contains('\0') {
        return Err(reject("backslash or NUL in URL"));
    }

    let mut parts = vec![scheme];
    for (i, segment) in rest.split('/').enumerate() {
        match segment {
            "" if i == 0 => return Err(reject("empty host")),
            "" => return Err(reject("empty path segment")),
            "." | ".." => return Err(reject("relative path segment")),
            _ => parts.push(segment),
        }
    }

    if parts.len() < 3 {
        return Err(reject("no artifact path after host"));
    }

    Ok(parts)
}

/// RFC 3986 scheme grammar, restricted to lowercase
fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
}
