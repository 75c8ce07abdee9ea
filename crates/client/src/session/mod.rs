//! Session store: dual-tier persistence of the caller's identity.
//!
//! The store owns the credential/user-summary pair. Two tiers back it:
//!
//! 1. A process-scoped cache, authoritative while this page load is
//!    alive.
//! 2. A cookie jar ([`CookieStore`]), the durability fallback that keeps
//!    identity across reloads for up to a day.
//!
//! Reads prefer the cache; writes and clears always hit both tiers. Every
//! failure mode - poisoned lock, unavailable jar, corrupt stored summary -
//! degrades to "no session". Identity must never crash rendering.

mod cookie;

pub use cookie::{COOKIE_MAX_AGE_SECONDS, Cookie, CookieStore, MemoryCookies};

use std::sync::{Arc, RwLock};

use vitalink_core::{Credential, UserSummary};

/// Default name of the credential cookie.
pub const DEFAULT_TOKEN_COOKIE: &str = "token";

/// Default name of the cached user-summary cookie.
pub const DEFAULT_USER_COOKIE: &str = "user";

/// The single owner of the credential and cached user summary.
///
/// Cloning is cheap; all clones share the same tiers. The dispatcher
/// holds a clone for credential reads and expiry-triggered clears; the
/// route guard only ever sees the cookie representation.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    cookies: Arc<dyn CookieStore>,
    credential_cache: RwLock<Option<Credential>>,
    summary_cache: RwLock<Option<UserSummary>>,
    token_cookie: String,
    user_cookie: String,
}

impl SessionStore {
    /// Create a store over the given cookie jar with the default cookie
    /// names.
    #[must_use]
    pub fn new(cookies: Arc<dyn CookieStore>) -> Self {
        Self::with_cookie_names(cookies, DEFAULT_TOKEN_COOKIE, DEFAULT_USER_COOKIE)
    }

    /// Create a store with explicit cookie names (from configuration).
    #[must_use]
    pub fn with_cookie_names(
        cookies: Arc<dyn CookieStore>,
        token_cookie: &str,
        user_cookie: &str,
    ) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                cookies,
                credential_cache: RwLock::new(None),
                summary_cache: RwLock::new(None),
                token_cookie: token_cookie.to_owned(),
                user_cookie: user_cookie.to_owned(),
            }),
        }
    }

    /// Name of the credential cookie, as seen on the wire by the route
    /// guard.
    #[must_use]
    pub fn token_cookie_name(&self) -> &str {
        &self.inner.token_cookie
    }

    /// Persist a credential and its user summary to both tiers.
    ///
    /// The two values are written together so the summary can never
    /// outlive or predate its credential. A summary that fails to
    /// serialize is logged and skipped; the credential write always goes
    /// through.
    pub fn set_session(&self, credential: Credential, summary: UserSummary) {
        self.inner.cookies.set(Cookie::session(
            &self.inner.token_cookie,
            credential.as_str(),
        ));

        match serde_json::to_string(&summary) {
            Ok(json) => {
                let encoded = urlencoding::encode(&json).into_owned();
                self.inner
                    .cookies
                    .set(Cookie::session(&self.inner.user_cookie, &encoded));
            }
            Err(err) => {
                // Summary is display-only; losing it costs one hydration
                // round trip, not identity.
                tracing::warn!(error = %err, "skipping user summary write");
            }
        }

        if let Ok(mut cached) = self.inner.summary_cache.write() {
            *cached = Some(summary);
        }
        if let Ok(mut cached) = self.inner.credential_cache.write() {
            *cached = Some(credential);
        }
    }

    /// The current credential: cache tier first, cookie fallback.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        let cached = self
            .inner
            .credential_cache
            .read()
            .ok()
            .and_then(|guard| guard.clone());
        if cached.is_some() {
            return cached;
        }

        self.inner
            .cookies
            .get(&self.inner.token_cookie)
            .filter(|value| !value.is_empty())
            .map(Credential::new)
    }

    /// The cached user summary, independent of the credential.
    ///
    /// A stored value that fails to decode (corrupt or legacy shape)
    /// reads as `None`.
    #[must_use]
    pub fn user_summary(&self) -> Option<UserSummary> {
        let cached = self
            .inner
            .summary_cache
            .read()
            .ok()
            .and_then(|guard| guard.clone());
        if cached.is_some() {
            return cached;
        }

        let raw = self.inner.cookies.get(&self.inner.user_cookie)?;
        let decoded = urlencoding::decode(&raw).ok()?;
        serde_json::from_str(&decoded).ok()
    }

    /// Drop the session from both tiers.
    ///
    /// Expires both cookies and empties the cache. Idempotent; clearing
    /// an absent session is a no-op.
    pub fn clear_session(&self) {
        self.inner
            .cookies
            .set(Cookie::expired(&self.inner.token_cookie));
        self.inner
            .cookies
            .set(Cookie::expired(&self.inner.user_cookie));

        if let Ok(mut cached) = self.inner.credential_cache.write() {
            *cached = None;
        }
        if let Ok(mut cached) = self.inner.summary_cache.write() {
            *cached = None;
        }
    }

    /// Whether a credential is currently present. No network call; says
    /// nothing about whether the service still accepts it.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.credential().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalink_core::{Email, UserId};

    fn summary() -> UserSummary {
        UserSummary {
            user_id: UserId::new(7),
            first_name: "Asha".to_owned(),
            last_name: "Rao".to_owned(),
            email: Email::parse("asha@example.com").expect("valid email"),
        }
    }

    fn store_with_jar() -> (SessionStore, Arc<MemoryCookies>) {
        let jar = Arc::new(MemoryCookies::new());
        (SessionStore::new(jar.clone()), jar)
    }

    #[test]
    fn test_set_then_get_returns_same_credential() {
        let (store, _jar) = store_with_jar();
        store.set_session(Credential::from("tok-1"), summary());
        assert_eq!(store.credential(), Some(Credential::from("tok-1")));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_summary_written_atomically_with_credential() {
        let (store, _jar) = store_with_jar();
        store.set_session(Credential::from("tok-1"), summary());
        let stored = store.user_summary().expect("summary present");
        assert_eq!(stored.full_name(), "Asha Rao");
    }

    #[test]
    fn test_cookie_tier_survives_cache_loss() {
        let jar = Arc::new(MemoryCookies::new());
        let first_load = SessionStore::new(jar.clone());
        first_load.set_session(Credential::from("tok-1"), summary());

        // A fresh store over the same jar models a page reload: the cache
        // tier is gone, the cookie tier is not.
        let second_load = SessionStore::new(jar);
        assert_eq!(second_load.credential(), Some(Credential::from("tok-1")));
        assert_eq!(second_load.user_summary(), Some(summary()));
    }

    #[test]
    fn test_cache_tier_wins_when_both_present() {
        let jar = Arc::new(MemoryCookies::new());
        let store = SessionStore::new(jar.clone());
        store.set_session(Credential::from("fresh"), summary());

        // Stale cookie written behind the store's back must not shadow
        // the richer tier.
        jar.set(Cookie::session(DEFAULT_TOKEN_COOKIE, "stale"));
        assert_eq!(store.credential(), Some(Credential::from("fresh")));
    }

    #[test]
    fn test_corrupt_summary_cookie_reads_as_none() {
        let (store, jar) = store_with_jar();
        jar.set(Cookie::session(DEFAULT_USER_COOKIE, "not%20json"));
        assert_eq!(store.user_summary(), None);
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let (store, _jar) = store_with_jar();
        store.set_session(Credential::from("tok-1"), summary());

        store.clear_session();
        assert_eq!(store.credential(), None);
        assert!(!store.is_authenticated());

        // Second clear of an already-empty session is a no-op, not an
        // error.
        store.clear_session();
        assert_eq!(store.credential(), None);
    }

    #[test]
    fn test_empty_cookie_value_is_anonymous() {
        let (store, jar) = store_with_jar();
        jar.set(Cookie::session(DEFAULT_TOKEN_COOKIE, ""));
        assert_eq!(store.credential(), None);
    }
}
