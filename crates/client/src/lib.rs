//! Vitalink client library.
//!
//! Every view in the Vitalink frontend issues its service calls through
//! this crate. It owns the three pieces of the app with real failure
//! semantics:
//!
//! - [`session`] - the session store: dual-tier persistence of the bearer
//!   credential and the cached user summary.
//! - [`dispatch`] - the request dispatcher: credential injection, retry
//!   with backoff, and a typed error taxonomy shared by every call site.
//! - [`guard`] - the route guard: per-navigation redirect decisions based
//!   on credential-cookie presence.
//!
//! Everything else - what the payloads mean, how results are rendered -
//! belongs to the views and the service, not to this crate.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dispatch;
pub mod guard;
pub mod notify;
pub mod session;

pub use config::{ClientConfig, ConfigError, GuardPaths};
pub use dispatch::{ApiClient, ApiError, RetryPolicy};
pub use guard::{GuardDecision, RouteClass, RouteGuard, route_guard_middleware};
pub use notify::{Notify, TracingNotifier};
pub use session::{Cookie, CookieStore, MemoryCookies, SessionStore};
