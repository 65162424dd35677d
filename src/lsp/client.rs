//! Client notification abstraction for LSP communication.
//!
//! `ClientNotifier` wraps `tower_lsp_server::Client` and centralizes the
//! messages the server sends on its own: log messages and semantic token
//! refresh requests.

use std::sync::OnceLock;
use tower_lsp_server::Client;
use tower_lsp_server::ls_types::{ClientCapabilities, MessageType};

use crate::lsp::{SettingsEvent, SettingsEventKind};

/// Check if client capabilities indicate semantic tokens refresh support.
///
/// Returns `false` for any missing/null capability in the chain.
pub(crate) fn check_semantic_tokens_refresh_support(caps: &ClientCapabilities) -> bool {
    caps.workspace
        .as_ref()
        .and_then(|w| w.semantic_tokens.as_ref())
        .and_then(|st| st.refresh_support)
        .unwrap_or(false)
}

#[derive(Clone)]
pub(crate) struct ClientNotifier<'a> {
    client: Client,
    /// Set once `initialize` has been handled
    client_capabilities: &'a OnceLock<ClientCapabilities>,
}

impl std::fmt::Debug for ClientNotifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientNotifier")
            .field("client", &self.client)
            .field("client_capabilities", &"&OnceLock<ClientCapabilities>")
            .finish()
    }
}

impl<'a> ClientNotifier<'a> {
    pub(crate) fn new(
        client: Client,
        client_capabilities: &'a OnceLock<ClientCapabilities>,
    ) -> Self {
        Self {
            client,
            client_capabilities,
        }
    }

    pub(crate) async fn log(&self, level: MessageType, message: impl Into<String>) {
        self.client.log_message(level, message.into()).await;
    }

    pub(crate) async fn log_info(&self, message: impl Into<String>) {
        self.log(MessageType::INFO, message).await;
    }

    pub(crate) async fn log_warning(&self, message: impl Into<String>) {
        self.log(MessageType::WARNING, message).await;
    }

    /// Returns true only if client declared workspace.semanticTokens.refreshSupport.
    /// Returns false if initialize() hasn't been called yet (OnceLock is empty).
    pub(crate) fn supports_semantic_tokens_refresh(&self) -> bool {
        self.client_capabilities
            .get()
            .map(check_semantic_tokens_refresh_support)
            .unwrap_or(false)
    }

    /// Ask the client to re-request semantic tokens for all documents.
    ///
    /// Fire-and-forget: the response is just null, and some clients never
    /// answer it.
    pub(crate) fn request_semantic_tokens_refresh(&self) {
        if !self.supports_semantic_tokens_refresh() {
            log::debug!(
                target: "ts_semantic_ls::lsp",
                "Skipping semantic_tokens_refresh - client does not support it"
            );
            return;
        }

        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(err) = client.semantic_tokens_refresh().await {
                log::debug!(
                    target: "ts_semantic_ls::lsp",
                    "semantic_tokens_refresh failed: {}",
                    err
                );
            }
        });
    }

    /// Forward settings events as log messages at matching levels.
    pub(crate) async fn log_settings_events(&self, events: &[SettingsEvent]) {
        for event in events {
            let message_type = match event.kind {
                SettingsEventKind::Info => MessageType::INFO,
                SettingsEventKind::Warning => MessageType::WARNING,
            };
            self.client
                .log_message(message_type, event.message.clone())
                .await;
        }
    }
}
