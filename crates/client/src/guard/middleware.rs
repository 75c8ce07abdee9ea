//! axum adapter for the route guard.
//!
//! The hosting runtime invokes the guard once per navigation by layering
//! this middleware over its page router:
//!
//! ```rust,ignore
//! use axum::{Router, middleware};
//! use vitalink_client::guard::{RouteGuard, route_guard_middleware};
//!
//! let guard = RouteGuard::new(config.guard.clone(), &config.token_cookie);
//! let app: Router = pages
//!     .layer(middleware::from_fn_with_state(guard, route_guard_middleware));
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{GuardDecision, RouteGuard};

/// Check the navigation before any handler runs.
///
/// Redirect decisions become 307 responses so the browser re-issues the
/// navigation against the new location; proceed decisions pass the
/// request through untouched.
pub async fn route_guard_middleware(
    State(guard): State<RouteGuard>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let has_credential = guard.credential_cookie_present(request.headers());

    match guard.check(&path, has_credential) {
        GuardDecision::Proceed => next.run(request).await,
        GuardDecision::Redirect(location) => {
            tracing::debug!(%path, %location, "navigation redirected");
            Redirect::temporary(&location).into_response()
        }
    }
}
