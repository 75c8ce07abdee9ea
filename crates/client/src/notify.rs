//! Notification sink for user-facing failures.
//!
//! The dispatcher pushes a short message here whenever a request fails in
//! a way the user should hear about (every surfaced failure except 404,
//! which call sites render as their own empty state). Presentation is not
//! this crate's concern; the host wires in whatever toast or banner
//! implementation it likes.

use std::sync::Arc;

/// Fire-and-forget sink for user-facing failure messages.
pub trait Notify: Send + Sync {
    /// Deliver a message to the user. Must not block or fail.
    fn notify(&self, message: &str);
}

/// Default sink that forwards messages to the `tracing` pipeline.
///
/// Useful in tests and headless embeddings where there is no UI to toast
/// into.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notify for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "vitalink::notify", message, "user-facing failure");
    }
}

impl<T: Notify + ?Sized> Notify for Arc<T> {
    fn notify(&self, message: &str) {
        (**self).notify(message);
    }
}
