//! Cookie tier of the session store.
//!
//! The credential and the cached user summary are mirrored into cookies
//! so identity survives a reload even when the in-process tier is gone.
//! The [`CookieStore`] trait abstracts the jar itself: the browser's in a
//! real deployment, [`MemoryCookies`] in tests and headless embeddings.

use std::collections::HashMap;
use std::sync::RwLock;

/// Cookie path; the session cookies are visible to every route.
const COOKIE_PATH: &str = "/";

/// Cookie lifetime in seconds (one day).
pub const COOKIE_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// A session cookie with the fixed attribute set from the persistence
/// boundary: `Path=/`, a one-day `Max-Age`, `SameSite=Lax`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value. Must already be cookie-safe (URL-encoded if needed).
    pub value: String,
    /// Lifetime in seconds. Zero expires the cookie immediately.
    pub max_age_seconds: u64,
}

impl Cookie {
    /// A live session cookie with the standard one-day lifetime.
    #[must_use]
    pub fn session(name: &str, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_owned(),
            max_age_seconds: COOKIE_MAX_AGE_SECONDS,
        }
    }

    /// An immediately-expired cookie, used to clear a previous value.
    #[must_use]
    pub fn expired(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            value: String::new(),
            max_age_seconds: 0,
        }
    }

    /// Render the cookie as a `Set-Cookie` header value.
    ///
    /// This is the wire form a hosting server emits when it flushes a
    /// jar write onto an HTTP response, e.g. after completing a login.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Path={}; Max-Age={}; SameSite=Lax",
            self.name, self.value, COOKIE_PATH, self.max_age_seconds
        )
    }
}

/// The cookie jar the session store writes through.
///
/// Implementations must treat a zero `Max-Age` as removal and must never
/// panic; a jar that is unavailable simply reads as empty.
pub trait CookieStore: Send + Sync {
    /// Current value of the named cookie, if present and unexpired.
    fn get(&self, name: &str) -> Option<String>;

    /// Apply a cookie write. A zero `max_age_seconds` removes the cookie.
    fn set(&self, cookie: Cookie);
}

/// In-memory [`CookieStore`].
///
/// Holds name/value pairs behind an `RwLock`. A poisoned lock degrades to
/// an empty jar rather than propagating the panic, matching the session
/// store's "identity must never crash rendering" rule.
#[derive(Debug, Default)]
pub struct MemoryCookies {
    jar: RwLock<HashMap<String, String>>,
}

impl MemoryCookies {
    /// Create an empty jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.jar.read().ok().and_then(|jar| jar.get(name).cloned())
    }

    fn set(&self, cookie: Cookie) {
        if let Ok(mut jar) = self.jar.write() {
            if cookie.max_age_seconds == 0 {
                jar.remove(&cookie.name);
            } else {
                jar.insert(cookie.name, cookie.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_header_value() {
        let cookie = Cookie::session("token", "abc123");
        assert_eq!(
            cookie.header_value(),
            "token=abc123; Path=/; Max-Age=86400; SameSite=Lax"
        );
    }

    #[test]
    fn test_expired_cookie_header_value() {
        let cookie = Cookie::expired("token");
        assert_eq!(
            cookie.header_value(),
            "token=; Path=/; Max-Age=0; SameSite=Lax"
        );
    }

    #[test]
    fn test_memory_jar_set_get() {
        let jar = MemoryCookies::new();
        jar.set(Cookie::session("token", "abc"));
        assert_eq!(jar.get("token").as_deref(), Some("abc"));
        assert_eq!(jar.get("other"), None);
    }

    #[test]
    fn test_memory_jar_expiry_removes() {
        let jar = MemoryCookies::new();
        jar.set(Cookie::session("token", "abc"));
        jar.set(Cookie::expired("token"));
        assert_eq!(jar.get("token"), None);
    }
}
