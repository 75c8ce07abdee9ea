//! Failure taxonomy for the request dispatcher.
//!
//! Every call site sees the same six shapes, so views can branch on what
//! happened without parsing strings: transport never reached the service,
//! the session died, access was denied, the thing is missing, the service
//! broke, or the request itself was bad.

use thiserror::Error;

/// Typed failure returned by [`ApiClient::dispatch`](super::ApiClient::dispatch).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The call never obtained an HTTP response (DNS, connect, or stream
    /// failure). Retried with a fixed delay before being surfaced.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service rejected the credential (401). The session store has
    /// already been cleared by the time callers see this.
    #[error("session expired, please sign in again")]
    SessionExpired,

    /// The credential is valid but not allowed to do this (403).
    #[error("access denied")]
    AccessDenied,

    /// The resource does not exist (404). The only surfaced failure that
    /// is never pushed to the notification sink.
    #[error("not found: {0}")]
    NotFound(String),

    /// The service failed (5xx) and retries, where permitted, were
    /// exhausted.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body, or synthesized.
        message: String,
    },

    /// Any other rejection: a non-2xx status outside the cases above, or
    /// a 2xx whose body was not valid JSON.
    #[error("request failed: {message}")]
    Request {
        /// HTTP status code, when a response was obtained.
        status: Option<u16>,
        /// Message extracted from the response body, or synthesized.
        message: String,
    },
}

impl ApiError {
    /// Whether this failure invalidated the stored session.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}
