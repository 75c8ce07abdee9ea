//! Test harness for the Vitalink client core.
//!
//! Provides the pieces the end-to-end tests share:
//!
//! - [`ScriptedService`] - an in-process axum server that replays a queue
//!   of canned responses and records what each request looked like.
//! - [`spawn_flaky_transport`] - a raw TCP listener that kills the first
//!   N connections before speaking HTTP, to provoke genuine transport
//!   failures (connection closed, no status code).
//! - [`TestContext`] - a real [`ApiClient`] wired to a fresh session
//!   store, an in-memory cookie jar, and a recording notification sink,
//!   with retry delays tightened so tests run in milliseconds.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use vitalink_client::{
    ApiClient, ClientConfig, MemoryCookies, Notify, RetryPolicy, SessionStore,
};

/// Initialize tracing once per test binary. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Scripted service
// ─────────────────────────────────────────────────────────────────────────────

/// Shared state of the scripted service: the response queue plus a
/// recording of what the dispatcher actually sent.
#[derive(Default)]
pub struct Script {
    responses: Mutex<Vec<(u16, String)>>,
    hits: AtomicUsize,
    last_authorization: Mutex<Option<String>>,
    last_content_type: Mutex<Option<String>>,
}

impl Script {
    /// Number of requests the service has answered.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `Authorization` header of the most recent request, if any.
    pub fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().expect("lock").clone()
    }

    /// `Content-Type` header of the most recent request, if any.
    pub fn last_content_type(&self) -> Option<String> {
        self.last_content_type.lock().expect("lock").clone()
    }
}

/// An in-process service that answers each request with the next scripted
/// `(status, body)` pair. Once the script runs dry it answers `200` with
/// an empty body.
pub struct ScriptedService {
    /// Base URL of the spawned server, e.g. `http://127.0.0.1:49152`.
    pub base_url: String,
    /// Shared request recording.
    pub script: Arc<Script>,
}

impl ScriptedService {
    /// Bind an ephemeral port and serve the given script.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind; test-only code.
    pub async fn spawn(responses: Vec<(u16, &str)>) -> Self {
        let script = Arc::new(Script {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| (status, body.to_owned()))
                    .collect(),
            ),
            ..Script::default()
        });

        let app = Router::new()
            .fallback(replay)
            .with_state(script.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            script,
        }
    }
}

/// Handler: record the request, pop the next scripted response.
async fn replay(State(script): State<Arc<Script>>, headers: HeaderMap) -> Response {
    script.hits.fetch_add(1, Ordering::SeqCst);
    *script.last_authorization.lock().expect("lock") = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    *script.last_content_type.lock().expect("lock") = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let (status, body) = {
        let mut responses = script.responses.lock().expect("lock");
        if responses.is_empty() {
            (200, String::new())
        } else {
            responses.remove(0)
        }
    };

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(status).expect("scripted status"));
    if !body.is_empty() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    builder.body(Body::from(body)).expect("scripted response")
}

// ─────────────────────────────────────────────────────────────────────────────
// Flaky transport
// ─────────────────────────────────────────────────────────────────────────────

/// Serve `body` as a 200 JSON response, but close the first `failures`
/// connections before sending anything, so the client sees pure
/// transport failures with no status code attached.
///
/// # Panics
///
/// Panics if the listener cannot bind; test-only code.
pub async fn spawn_flaky_transport(failures: usize, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind flaky listener");
    let addr = listener.local_addr().expect("listener addr");

    tokio::spawn(async move {
        let mut remaining = failures;
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };

            if remaining > 0 {
                remaining -= 1;
                drop(socket);
                continue;
            }

            // Read the request head, then answer by hand and close.
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        head.extend_from_slice(buf.get(..n).unwrap_or_default());
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    addr
}

/// An address that refuses every connection: bind a listener, learn the
/// port, drop the listener.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    listener.local_addr().expect("listener addr")
}

// ─────────────────────────────────────────────────────────────────────────────
// Test context
// ─────────────────────────────────────────────────────────────────────────────

/// Notification sink that records every message for assertions.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// All messages pushed so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("lock").clone()
    }

    /// Number of messages pushed so far.
    pub fn count(&self) -> usize {
        self.messages.lock().expect("lock").len()
    }
}

impl Notify for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().expect("lock").push(message.to_owned());
    }
}

/// A configuration pointed at a test server, with delays tightened so
/// retry paths complete in milliseconds.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig {
        api_url: base_url.to_owned(),
        request_timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_attempts: 3,
            transport_delay: Duration::from_millis(10),
            base_delay: Duration::from_millis(5),
        },
        ..ClientConfig::default()
    }
}

/// A fully wired client with observable collaborators.
pub struct TestContext {
    /// The client under test.
    pub client: ApiClient,
    /// The session store the client reads and clears.
    pub session: SessionStore,
    /// The cookie jar behind the session store.
    pub jar: Arc<MemoryCookies>,
    /// The recording notification sink.
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    /// Wire a client against the given base URL.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client fails to build; test-only code.
    pub fn new(base_url: &str) -> Self {
        init_tracing();

        let jar = Arc::new(MemoryCookies::new());
        let session = SessionStore::new(jar.clone());
        let notifier = Arc::new(RecordingNotifier::default());
        let client = ApiClient::new(&test_config(base_url), session.clone(), notifier.clone())
            .expect("build api client");

        Self {
            client,
            session,
            jar,
            notifier,
        }
    }
}
