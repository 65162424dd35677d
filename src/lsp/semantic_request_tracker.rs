//! Request tracking for semantic token operations to support cancellation.
//!
//! When a new semantic token request arrives for a URI, it supersedes any
//! in-flight request for that URI: the older request's token is cancelled,
//! which stops its tsserver round trip or settle wait at the next await.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Monotonically increasing request ID for tracking
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> u64 {
    NEXT_REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// A tracked request: its ID and the token that cancels it
#[derive(Debug, Clone)]
pub struct TrackedRequest {
    pub id: u64,
    pub cancel: CancellationToken,
}

/// Tracks active semantic token requests to support cancellation
#[derive(Debug, Clone, Default)]
pub struct SemanticRequestTracker {
    /// Maps URI to the most recent active request
    active_requests: Arc<DashMap<Url, TrackedRequest>>,
}

impl SemanticRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a new request for the given URI, cancelling any
    /// previous request for the same URI.
    pub fn start_request(&self, uri: &Url) -> TrackedRequest {
        let request = TrackedRequest {
            id: next_request_id(),
            cancel: CancellationToken::new(),
        };

        if let Some(previous) = self.active_requests.insert(uri.clone(), request.clone()) {
            previous.cancel.cancel();
        }
        request
    }

    /// Returns true if the request has not been superseded or cancelled.
    pub fn is_active(&self, uri: &Url, request_id: u64) -> bool {
        self.active_requests
            .get(uri)
            .map(|entry| entry.id == request_id && !entry.cancel.is_cancelled())
            .unwrap_or(false)
    }

    /// Finishes a request, removing it from tracking if it's still the active one.
    pub fn finish_request(&self, uri: &Url, request_id: u64) {
        self.active_requests
            .remove_if(uri, |_, entry| entry.id == request_id);
    }

    /// Cancels all requests for a given URI.
    pub fn cancel_all_for_uri(&self, uri: &Url) {
        if let Some((_, request)) = self.active_requests.remove(uri) {
            request.cancel.cancel();
        }
    }

    /// Cancels every tracked request (on shutdown).
    pub fn cancel_all(&self) {
        for entry in self.active_requests.iter() {
            entry.cancel.cancel();
        }
        self.active_requests.clear();
    }
}
