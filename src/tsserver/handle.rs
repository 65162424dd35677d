//! Swappable reference to the running tsserver connection.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, MutexGuard};

use crate::document::DocumentStore;
use crate::service::{ClassificationRequest, ClassificationResponse, ClassificationService};

use super::client::TsServerClient;

/// The current tsserver connection, if one is running.
///
/// The connection is replaced when its launch settings change; requests in
/// flight keep the client they started with.
///
/// Document sync holds [`TsServerHandle::lock_sync`] from the store update
/// until the edit has been forwarded. [`TsServerHandle::install`] takes the
/// same lock, so a new connection sees every document exactly as stored.
#[derive(Default)]
pub struct TsServerHandle {
    current: ArcSwapOption<TsServerClient>,
    sync: Mutex<()>,
}

impl TsServerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<TsServerClient>> {
        self.current.load_full()
    }

    /// Install `client` and return the previous one.
    pub fn replace(&self, client: Option<Arc<TsServerClient>>) -> Option<Arc<TsServerClient>> {
        self.current.swap(client)
    }

    pub fn take(&self) -> Option<Arc<TsServerClient>> {
        self.replace(None)
    }

    pub async fn lock_sync(&self) -> MutexGuard<'_, ()> {
        self.sync.lock().await
    }

    /// Install `client`, then open every document of `documents` in it.
    ///
    /// Returns the previous client, which the caller retires.
    pub async fn install(
        &self,
        client: Arc<TsServerClient>,
        documents: &DocumentStore,
    ) -> Option<Arc<TsServerClient>> {
        let _sync = self.lock_sync().await;
        let previous = self.replace(Some(Arc::clone(&client)));

        for (path, text, script_kind) in documents.open_files() {
            if let Err(err) = client.open(&path, &text, script_kind).await {
                log::warn!(
                    target: "ts_semantic_ls::tsserver",
                    "Failed to open {} in tsserver: {}",
                    path.display(),
                    err
                );
            }
        }
        previous
    }
}

impl ClassificationService for TsServerHandle {
    async fn classify(&self, request: ClassificationRequest) -> Option<ClassificationResponse> {
        let Some(client) = self.get() else {
            log::debug!(
                target: "ts_semantic_ls::tsserver",
                "No tsserver running, skipping classification"
            );
            return None;
        };
        client.classify(request).await
    }
}
