//! Routing of tsserver responses to the requests waiting for them.
//!
//! Register a sequence number before writing the request, then await the
//! receiver without holding any lock. The reader task calls `route()` for
//! each incoming response, and `fail_all()` once it stops. After that the
//! router is closed and refuses new registrations.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::{BridgeError, BridgeResult};

use super::protocol::Response;

#[derive(Default)]
struct Pending {
    waiters: HashMap<u64, oneshot::Sender<Response>>,
    closed: bool,
}

pub struct ResponseRouter {
    pending: Mutex<Pending>,
}

impl Default for ResponseRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRouter {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Pending::default()),
        }
    }

    /// Register a pending request.
    ///
    /// Fails if `seq` is already pending, or with
    /// [`BridgeError::ServerExited`] once the router is closed.
    pub fn register(&self, seq: u64) -> BridgeResult<oneshot::Receiver<Response>> {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.closed {
            return Err(BridgeError::server_exited("tsserver connection closed"));
        }
        if pending.waiters.contains_key(&seq) {
            return Err(BridgeError::protocol(format!("Duplicate request seq {seq}")));
        }
        let (tx, rx) = oneshot::channel();
        pending.waiters.insert(seq, tx);
        Ok(rx)
    }

    /// Deliver a response. Returns `true` if a waiter received it.
    pub fn route(&self, response: Response) -> bool {
        let tx = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .waiters
            .remove(&response.request_seq);

        match tx {
            Some(sender) => sender.send(response).is_ok(),
            None => false,
        }
    }

    /// Forget a pending request without answering it.
    pub fn remove(&self, seq: u64) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .waiters
            .remove(&seq)
            .is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .waiters
            .len()
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).closed
    }

    /// Answer every pending request with a synthesised failure and close
    /// the router.
    ///
    /// Called when the connection is gone and no real responses will arrive.
    pub fn fail_all(&self, message: &str) {
        let entries: Vec<_> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.closed = true;
            pending.waiters.drain().collect()
        };

        for (seq, tx) in entries {
            let _ = tx.send(Response::failed(seq, message));
        }
    }
}
