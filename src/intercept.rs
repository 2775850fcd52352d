//! Interception-hook interface and pending-request tracking
//!
//! The engine never talks to a network stack directly. The host test runner
//! owns some interception mechanism; an adapter over that mechanism routes
//! every outgoing request through an installed [`InterceptHook`] and reports
//! completions back. The core depends only on this interface.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::storage::{Body, Interaction};

/// An outgoing request observed before dispatch
#[derive(Debug, Clone)]
pub struct LiveRequest {
    /// HTTP verb
    pub method: String,
    /// Raw URL as the page issued it (absolute or relative)
    pub url: String,
    /// Request body, if one was attached
    pub body: Option<Value>,
}

/// A completed request/response pair handed to the hook after the network
/// round trip finished
#[derive(Debug, Clone)]
pub struct RawExchange {
    /// HTTP verb
    pub method: String,
    /// Raw URL as issued
    pub url: String,
    /// Structurally-cloned request body (`Value::Null` when absent)
    pub request: Value,
    /// Raw response body text
    pub response: String,
    /// HTTP status code
    pub status: u16,
    /// HTTP status text
    pub status_text: String,
    /// Response `Content-Type` header (empty when absent)
    pub content_type: String,
}

/// A response synthesized from a recorded interaction instead of the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticResponse {
    /// HTTP status code
    pub status: u16,
    /// HTTP status text
    pub status_text: String,
    /// `Content-Type` to serve
    pub content_type: String,
    /// Response body text
    pub body: String,
}

impl SyntheticResponse {
    /// Build the response served for a resolved mock.
    ///
    /// Canonical re-encoding policy: JSON bodies are always re-serialized to
    /// text and served with the recorded JSON content type; text and HTML
    /// bodies pass through verbatim. Returns `None` when the interaction has
    /// no body attached (fixture not loaded), which callers treat as a miss.
    #[must_use]
    pub fn from_interaction(interaction: &Interaction) -> Option<Self> {
        let body = match interaction.response.as_ref()? {
            Body::Json(value) => value.to_string(),
            Body::Text(text) => text.clone(),
        };

        Some(Self {
            status: interaction.status,
            status_text: interaction.status_text.clone(),
            content_type: interaction.content_type.clone(),
            body,
        })
    }
}

/// Registrable interface driven by the host's interception adapter.
///
/// Contract: every call to [`before_dispatch`](Self::before_dispatch) that
/// returns `None` (the request went to the real network) must be balanced by
/// exactly one [`on_complete`](Self::on_complete) call. Dispatches answered
/// with a synthetic response never reach the network and are not reported.
pub trait InterceptHook {
    /// Observe a request before dispatch. `Some` short-circuits the network
    /// with a synthetic response; `None` lets the request fall through live.
    fn before_dispatch(&mut self, request: &LiveRequest) -> Option<SyntheticResponse>;

    /// Observe a completed live exchange.
    fn on_complete(&mut self, exchange: RawExchange);
}

/// Host-side registration point for the interception hook
pub trait HookRegistrar {
    /// Install `hook` so every outgoing request is routed through it
    fn install(&mut self, hook: Arc<Mutex<dyn InterceptHook + Send>>);
}

/// Counts in-flight intercepted requests and notifies a single waiter when
/// the count returns to zero.
///
/// No timeout or cancellation: a hung request blocks the waiter
/// indefinitely. That is an accepted limitation of the recording model, not
/// something to paper over here.
#[derive(Debug, Default)]
pub struct PendingTracker {
    inner: Mutex<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    count: usize,
    waiter: Option<oneshot::Sender<()>>,
}

impl PendingTracker {
    /// Create a tracker with no in-flight requests
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Count an intercept-start
    pub fn start(&self) {
        self.lock().count += 1;
    }

    /// Count an intercept-end; the registered waiter fires exactly once when
    /// the count reaches zero.
    pub fn finish(&self) {
        let mut inner = self.lock();
        inner.count = inner.count.saturating_sub(1);
        if inner.count == 0 {
            if let Some(waiter) = inner.waiter.take() {
                let _ = waiter.send(());
            }
        }
    }

    /// Number of requests currently in flight
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock().count
    }

    /// Wait until the in-flight count is zero.
    ///
    /// Resolves immediately when nothing is pending. Only one waiter is
    /// supported; registering a new one releases any previous waiter.
    pub async fn wait(&self) {
        let rx = {
            let mut inner = self.lock();
            if inner.count == 0 {
                return;
            }
            let (tx, rx) = oneshot::channel();
            if let Some(previous) = inner.waiter.replace(tx) {
                let _ = previous.send(());
            }
            rx
        };

        // Err means the tracker was dropped; nothing left to wait for.
        let _ = rx.await;
    }
}
