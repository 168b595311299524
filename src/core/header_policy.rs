//! Header allow-list policies for the two trust boundaries.
//!
//! Two directions exist with an identical algorithm but different allow-lists:
//! the request direction governs which client headers may reach the auth
//! endpoint on a preflight round trip, and the authorization direction governs
//! which auth-response headers may be overlaid onto the backend request.
//! Decisions are memoized per header name for the process lifetime; the
//! allow-lists are immutable after startup so a cached answer never goes stale.
use std::collections::HashSet;

use scc::HashMap;

/// Header names always allowed on the client -> auth preflight leg.
pub const DEFAULT_ALLOWED_REQUEST_HEADERS: [&str; 9] = [
    "Origin",
    "Authorization",
    "Cookie",
    "From",
    "Proxy-Authorization",
    "User-Agent",
    "X-Forwarded-For",
    "X-Forwarded-Host",
    "X-Forwarded-Proto",
];

/// Header names always allowed on the auth response -> backend overlay.
pub const DEFAULT_ALLOWED_AUTHORIZATION_HEADERS: [&str; 5] = [
    "Authorization",
    "Location",
    "Proxy-Authenticate",
    "Set-Cookie",
    "WWW-Authenticate",
];

/// Case-insensitive header allow-list with a process-lifetime memo cache.
///
/// The cache is written by whichever request handler first evaluates a given
/// header name; `scc::HashMap` keeps concurrent first writes safe. Entries are
/// never evicted — the universe of header names actually seen is finite.
pub struct HeaderPolicy {
    allowed: HashSet<String>,
    cache: HashMap<String, bool>,
}

impl HeaderPolicy {
    fn new(configured: &[String], defaults: &[&str]) -> Self {
        let allowed = configured
            .iter()
            .map(|h| h.to_ascii_lowercase())
            .chain(defaults.iter().map(|h| h.to_ascii_lowercase()))
            .collect();
        Self {
            allowed,
            cache: HashMap::new(),
        }
    }

    /// Policy for the client -> auth preflight leg.
    pub fn request_direction(configured: &[String]) -> Self {
        Self::new(configured, &DEFAULT_ALLOWED_REQUEST_HEADERS)
    }

    /// Policy for the auth response -> backend overlay.
    pub fn authorization_direction(configured: &[String]) -> Self {
        Self::new(configured, &DEFAULT_ALLOWED_AUTHORIZATION_HEADERS)
    }

    /// Whether a header name may cross this policy's boundary. Pure and total.
    pub async fn is_allowed(&self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        if let Some(entry) = self.cache.get_async(&key).await {
            return *entry.get();
        }

        let allowed = self.allowed.contains(&key);
        let _ = self.cache.insert_async(key, allowed).await;
        allowed
    }
}
