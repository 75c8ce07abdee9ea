//! Request dispatcher: the single chokepoint for service calls.
//!
//! Every view talks to the Vitalink service through [`ApiClient`]. The
//! client injects the bearer credential, classifies failures into
//! [`ApiError`], retries what is safe to retry, and pushes user-facing
//! failures to the notification sink. Payloads pass through verbatim;
//! the dispatcher never interprets what the JSON means.
//!
//! # Retry policy
//!
//! - Transport failures (no response at all) are retried unconditionally
//!   with a fixed delay; they carry no status to branch on and are
//!   assumed short-lived.
//! - 5xx responses are retried with exponential backoff, but only for
//!   side-effect-free methods. A `POST` that timed out server-side may
//!   still have charged its effect; replaying it is how you double-count
//!   a donation.
//! - Both paths draw from one shared attempt ceiling.

mod error;

pub use error::ApiError;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use tracing::instrument;

use crate::config::ClientConfig;
use crate::notify::Notify;
use crate::session::SessionStore;

use vitalink_core::Credential;

/// Generic message for transport failures surfaced to the user.
const TRANSPORT_FAILURE_MESSAGE: &str =
    "Network error - please check your connection and try again.";

/// Message shown when the service rejects the stored credential.
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Message shown when the credential lacks permission for a call.
const ACCESS_DENIED_MESSAGE: &str = "You don't have permission to do that.";

/// Retry schedule for the dispatcher.
///
/// Plain data so tests can zero the delays. `max_attempts` is the total
/// attempt count (initial call included) shared by the transport and 5xx
/// retry paths.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before a retryable failure becomes final.
    pub max_attempts: u32,
    /// Fixed delay between transport-failure attempts.
    pub transport_delay: Duration,
    /// Base for the exponential 5xx backoff (`base * 2^attempt`).
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transport_delay: Duration::from_millis(500),
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying a 5xx, given the 1-based attempt that just
    /// failed.
    #[must_use]
    pub fn server_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Ephemeral, call-scoped request state.
///
/// Created per `dispatch` call and discarded when the call resolves.
/// There is no shared retry state between calls; two in-flight dispatches
/// interleave freely.
struct RequestAttempt {
    /// 1-based count of attempts issued so far.
    attempt: u32,
    /// Whether the method is side-effect-free and thus safe to replay on
    /// a server error.
    safe_to_retry: bool,
}

impl RequestAttempt {
    fn new(method: &Method) -> Self {
        Self {
            attempt: 0,
            safe_to_retry: method.is_safe(),
        }
    }

    fn bump(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }

    const fn exhausted(&self, policy: &RetryPolicy) -> bool {
        self.attempt >= policy.max_attempts
    }
}

/// What one attempt produced, before classification.
enum AttemptOutcome {
    /// A response was obtained and its body fully read.
    Response { status: StatusCode, body: String },
    /// No usable response: connect, DNS, or stream failure.
    Transport(reqwest::Error),
}

/// Shape of the service's error bodies, as far as the dispatcher cares.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the Vitalink service API.
///
/// Cheap to clone; clones share the HTTP connection pool, the session
/// store, and the notification sink.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    notifier: Arc<dyn Notify>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(
        config: &ClientConfig,
        session: SessionStore,
        notifier: Arc<dyn Notify>,
    ) -> Result<Self, ApiError> {
        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.trim_end_matches('/').to_owned(),
                session,
                notifier,
                retry: config.retry.clone(),
            }),
        })
    }

    /// The session store this client reads credentials from.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch
    // ─────────────────────────────────────────────────────────────────────

    /// Issue a call to the service and classify the outcome.
    ///
    /// The credential comes from `credential_override` when supplied
    /// (callers fresh out of login may hold a newer token than the
    /// store), otherwise it is re-read from the session store at the top
    /// of every attempt. No credential means an anonymous call: the
    /// `Authorization` header is omitted entirely.
    ///
    /// A 2xx with an empty body resolves to `Ok(None)`; any other 2xx
    /// body is parsed as JSON and returned verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] per the taxonomy: transport failures and 5xx
    /// responses after the retry budget is spent, and all non-retryable
    /// rejections immediately.
    #[instrument(skip(self, body, credential_override), fields(%endpoint, %method))]
    pub async fn dispatch(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
        credential_override: Option<&Credential>,
    ) -> Result<Option<Value>, ApiError> {
        let url = format!("{}{}", self.inner.base_url, endpoint);
        let mut state = RequestAttempt::new(&method);

        loop {
            let attempt = state.bump();

            let credential = match credential_override {
                Some(fresh) => Some(fresh.clone()),
                None => self.inner.session.credential(),
            };

            let mut request = self.inner.http.request(method.clone(), url.as_str());
            if let Some(ref credential) = credential {
                request = request.bearer_auth(credential.as_str());
            }
            if let Some(ref body) = body {
                request = request.json(body);
            }

            let outcome = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(body) => AttemptOutcome::Response { status, body },
                        Err(err) => AttemptOutcome::Transport(err),
                    }
                }
                Err(err) => AttemptOutcome::Transport(err),
            };

            match outcome {
                AttemptOutcome::Transport(err) => {
                    if state.exhausted(&self.inner.retry) {
                        self.inner.notifier.notify(TRANSPORT_FAILURE_MESSAGE);
                        return Err(ApiError::Transport(err));
                    }
                    tracing::warn!(attempt, error = %err, "transport failure, retrying");
                    sleep(self.inner.retry.transport_delay).await;
                }
                AttemptOutcome::Response { status, body } => {
                    if status.is_success() {
                        return self.decode_success(status, &body);
                    }

                    if status.is_server_error() {
                        if state.safe_to_retry && !state.exhausted(&self.inner.retry) {
                            tracing::warn!(attempt, %status, "server error, retrying");
                            sleep(self.inner.retry.server_delay(attempt)).await;
                            continue;
                        }
                        let message = extract_message(status, &body);
                        self.inner.notifier.notify(&message);
                        return Err(ApiError::Server {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    return Err(self.classify_rejection(endpoint, status, &body));
                }
            }
        }
    }

    /// Classify a non-2xx, non-5xx response. Never retried.
    fn classify_rejection(&self, endpoint: &str, status: StatusCode, body: &str) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                // The stored credential is dead; drop it so the next
                // protected navigation lands on sign-in.
                self.inner.session.clear_session();
                self.inner.notifier.notify(SESSION_EXPIRED_MESSAGE);
                ApiError::SessionExpired
            }
            StatusCode::FORBIDDEN => {
                self.inner.notifier.notify(ACCESS_DENIED_MESSAGE);
                ApiError::AccessDenied
            }
            // Call sites render their own empty state for 404s; no toast.
            StatusCode::NOT_FOUND => ApiError::NotFound(endpoint.to_owned()),
            _ => {
                let message = extract_message(status, body);
                self.inner.notifier.notify(&message);
                ApiError::Request {
                    status: Some(status.as_u16()),
                    message,
                }
            }
        }
    }

    /// Resolve a 2xx response to its payload.
    fn decode_success(&self, status: StatusCode, body: &str) -> Result<Option<Value>, ApiError> {
        if body.is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(body) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                let message = format!("malformed response body: {err}");
                self.inner.notifier.notify(&message);
                Err(ApiError::Request {
                    status: Some(status.as_u16()),
                    message,
                })
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Typed convenience wrappers
    // ─────────────────────────────────────────────────────────────────────

    /// `GET` an endpoint and deserialize its payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on dispatch failure, or a generic failure if
    /// the payload does not match `T`.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let payload = self.dispatch(endpoint, Method::GET, None, None).await?;
        decode_payload(payload)
    }

    /// `POST` a JSON body and deserialize the response payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on dispatch failure, or a generic failure if
    /// the payload does not match `T`.
    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        let payload = self
            .dispatch(endpoint, Method::POST, Some(body), None)
            .await?;
        decode_payload(payload)
    }

    /// `PUT` a JSON body and deserialize the response payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on dispatch failure, or a generic failure if
    /// the payload does not match `T`.
    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        let payload = self
            .dispatch(endpoint, Method::PUT, Some(body), None)
            .await?;
        decode_payload(payload)
    }

    /// `DELETE` an endpoint, discarding any payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on dispatch failure.
    pub async fn delete(&self, endpoint: &str) -> Result<(), ApiError> {
        self.dispatch(endpoint, Method::DELETE, None, None).await?;
        Ok(())
    }
}

/// Deserialize an opaque payload into the caller's type. An absent
/// payload deserializes from JSON `null`.
fn decode_payload<T: DeserializeOwned>(payload: Option<Value>) -> Result<T, ApiError> {
    let value = payload.unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|err| ApiError::Request {
        status: None,
        message: format!("unexpected payload shape: {err}"),
    })
}

/// Pull a user-facing message out of an error body, or synthesize one
/// from the status code.
fn extract_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_server_delay_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            transport_delay: Duration::from_millis(10),
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.server_delay(1), Duration::from_millis(200));
        assert_eq!(policy.server_delay(2), Duration::from_millis(400));
    }

    #[test]
    fn test_request_attempt_safety_derived_from_method() {
        assert!(RequestAttempt::new(&Method::GET).safe_to_retry);
        assert!(RequestAttempt::new(&Method::HEAD).safe_to_retry);
        assert!(!RequestAttempt::new(&Method::POST).safe_to_retry);
        assert!(!RequestAttempt::new(&Method::DELETE).safe_to_retry);
    }

    #[test]
    fn test_request_attempt_ceiling_is_cumulative() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..RetryPolicy::default()
        };
        let mut state = RequestAttempt::new(&Method::GET);
        state.bump();
        assert!(!state.exhausted(&policy));
        state.bump();
        assert!(state.exhausted(&policy));
    }

    #[test]
    fn test_extract_message_prefers_body() {
        let message = extract_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"donation date is in the future"}"#,
        );
        assert_eq!(message, "donation date is in the future");
    }

    #[test]
    fn test_extract_message_synthesizes_from_status() {
        assert_eq!(
            extract_message(StatusCode::BAD_REQUEST, "not json"),
            "Request failed with status 400"
        );
        assert_eq!(
            extract_message(StatusCode::UNPROCESSABLE_ENTITY, r#"{"message":""}"#),
            "Request failed with status 422"
        );
    }

    #[test]
    fn test_decode_payload_absent_is_null() {
        let value: Option<i64> = decode_payload(None).expect("null decodes");
        assert_eq!(value, None);
    }

    #[test]
    fn test_api_client_is_clone_send_sync() {
        fn assert_clone<T: Clone>() {}
        fn assert_send_sync<T: Send + Sync>() {}
        assert_clone::<ApiClient>();
        assert_send_sync::<ApiClient>();
    }
}
