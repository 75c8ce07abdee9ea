//! Route guard: per-navigation redirect decisions.
//!
//! Runs once per navigation, before any page is produced. The decision is
//! a pure function of the requested path and credential-cookie presence;
//! no network call, no session read beyond the cookie header. Presence is
//! trusted blindly here - whether the credential is still *good* is the
//! dispatcher's 401 path, the sole source of truth for validity.

mod middleware;

pub use middleware::route_guard_middleware;

use axum::http::HeaderMap;

use crate::config::GuardPaths;

/// Mutually exclusive classification of a navigation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a credential cookie.
    Protected,
    /// Sign-in/sign-up surface; identified callers are bounced away.
    AuthOnly,
    /// Anyone may pass.
    Public,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Let the navigation continue unchanged.
    Proceed,
    /// Redirect to the given location before producing any page.
    Redirect(String),
}

/// Static route classifier and redirect policy.
///
/// The two prefix lists are disjoint by configuration; a path matching
/// both would classify as protected, since that list is checked first.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    paths: GuardPaths,
    cookie_name: String,
}

impl RouteGuard {
    /// Build a guard from configured paths and the credential cookie
    /// name.
    #[must_use]
    pub fn new(paths: GuardPaths, cookie_name: &str) -> Self {
        Self {
            paths,
            cookie_name: cookie_name.to_owned(),
        }
    }

    /// Classify a path by static prefix membership.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if has_prefix(&self.paths.protected_prefixes, path) {
            RouteClass::Protected
        } else if has_prefix(&self.paths.auth_only_prefixes, path) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Public
        }
    }

    /// Decide a navigation. Pure and synchronous.
    ///
    /// - Protected path without a credential: redirect to sign-in, with
    ///   the original path preserved as the return destination.
    /// - Auth-only path with a credential: redirect to the landing path.
    /// - Everything else proceeds.
    #[must_use]
    pub fn check(&self, path: &str, has_credential: bool) -> GuardDecision {
        match self.classify(path) {
            RouteClass::Protected if !has_credential => GuardDecision::Redirect(format!(
                "{}?redirect={}",
                self.paths.login_path,
                urlencoding::encode(path)
            )),
            RouteClass::AuthOnly if has_credential => {
                GuardDecision::Redirect(self.paths.landing_path.clone())
            }
            _ => GuardDecision::Proceed,
        }
    }

    /// Whether the incoming `Cookie` headers carry a non-empty credential
    /// cookie.
    #[must_use]
    pub fn credential_cookie_present(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(axum::http::header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .any(|(name, value)| name == self.cookie_name && !value.is_empty())
    }
}

fn has_prefix(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DEFAULT_TOKEN_COOKIE;

    fn guard() -> RouteGuard {
        RouteGuard::new(GuardPaths::default(), DEFAULT_TOKEN_COOKIE)
    }

    #[test]
    fn test_classification() {
        let guard = guard();
        assert_eq!(guard.classify("/dashboard"), RouteClass::Protected);
        assert_eq!(guard.classify("/donate/schedule"), RouteClass::Protected);
        assert_eq!(guard.classify("/login"), RouteClass::AuthOnly);
        assert_eq!(guard.classify("/signup"), RouteClass::AuthOnly);
        assert_eq!(guard.classify("/"), RouteClass::Public);
        assert_eq!(guard.classify("/about"), RouteClass::Public);
    }

    #[test]
    fn test_protected_without_credential_redirects_to_login() {
        let decision = guard().check("/dashboard", false);
        assert_eq!(
            decision,
            GuardDecision::Redirect("/login?redirect=%2Fdashboard".to_owned())
        );
    }

    #[test]
    fn test_return_destination_preserves_full_path() {
        let decision = guard().check("/history/2026/08", false);
        assert_eq!(
            decision,
            GuardDecision::Redirect("/login?redirect=%2Fhistory%2F2026%2F08".to_owned())
        );
    }

    #[test]
    fn test_protected_with_credential_proceeds() {
        assert_eq!(guard().check("/dashboard", true), GuardDecision::Proceed);
    }

    #[test]
    fn test_auth_only_with_credential_redirects_to_landing() {
        assert_eq!(
            guard().check("/login", true),
            GuardDecision::Redirect("/dashboard".to_owned())
        );
        assert_eq!(
            guard().check("/signup", true),
            GuardDecision::Redirect("/dashboard".to_owned())
        );
    }

    #[test]
    fn test_auth_only_without_credential_proceeds() {
        assert_eq!(guard().check("/login", false), GuardDecision::Proceed);
    }

    #[test]
    fn test_public_always_proceeds() {
        assert_eq!(guard().check("/", false), GuardDecision::Proceed);
        assert_eq!(guard().check("/", true), GuardDecision::Proceed);
    }

    #[test]
    fn test_cookie_presence_parsing() {
        let guard = guard();
        let mut headers = HeaderMap::new();
        assert!(!guard.credential_cookie_present(&headers));

        headers.insert(
            axum::http::header::COOKIE,
            "theme=dark; token=abc123".parse().expect("header value"),
        );
        assert!(guard.credential_cookie_present(&headers));
    }

    #[test]
    fn test_empty_cookie_value_is_absent() {
        let guard = guard();
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            "token=".parse().expect("header value"),
        );
        assert!(!guard.credential_cookie_present(&headers));
    }
}
