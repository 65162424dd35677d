use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;
use serde_json::Value;
use tower_lsp_server::jsonrpc::Result;
use tower_lsp_server::ls_types::*;
use tower_lsp_server::{Client, LanguageServer};
use url::Url;

use crate::classification::Legend;
use crate::config::{TsServerSettings, WorkspaceSettings};
use crate::document::DocumentStore;
use crate::semantic::{ProviderSettings, SemanticTokensProvider};
use crate::tsserver::{TsServerClient, TsServerHandle};

use super::client::ClientNotifier;
use super::semantic_request_tracker::SemanticRequestTracker;
use super::settings::{SettingsLoadOutcome, SettingsSource, load_settings};

mod text_document;

/// Convert an `ls_types::Uri` into the `url::Url` used as document key.
pub(crate) fn uri_to_url(uri: &Uri) -> std::result::Result<Url, url::ParseError> {
    Url::parse(uri.as_str())
}

pub struct TsSemanticLs {
    client: Client,
    client_capabilities: OnceLock<ClientCapabilities>,
    root_path: OnceLock<PathBuf>,
    documents: DocumentStore,
    settings: ArcSwap<WorkspaceSettings>,
    semantic_request_tracker: SemanticRequestTracker,
    tsserver: Arc<TsServerHandle>,
    provider: SemanticTokensProvider<Arc<TsServerHandle>>,
}

impl std::fmt::Debug for TsSemanticLs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsSemanticLs")
            .field("client", &self.client)
            .field("root_path", &self.root_path.get())
            .field("documents", &self.documents.len())
            .finish_non_exhaustive()
    }
}

impl TsSemanticLs {
    pub fn new(client: Client) -> Self {
        let settings = WorkspaceSettings::default();
        let tsserver = Arc::new(TsServerHandle::new());
        let provider = SemanticTokensProvider::new(
            Arc::clone(&tsserver),
            Arc::new(Legend::new()),
            ProviderSettings::from(&settings),
        );

        Self {
            client,
            client_capabilities: OnceLock::new(),
            root_path: OnceLock::new(),
            documents: DocumentStore::new(),
            settings: ArcSwap::from_pointee(settings),
            semantic_request_tracker: SemanticRequestTracker::new(),
            tsserver,
            provider,
        }
    }

    fn notifier(&self) -> ClientNotifier<'_> {
        ClientNotifier::new(self.client.clone(), &self.client_capabilities)
    }

    /// Load all configuration layers and apply the result.
    async fn reload_settings(&self, override_settings: Option<(SettingsSource, Value)>) {
        let root_path = self.root_path.get().cloned();
        let SettingsLoadOutcome { settings, events } =
            load_settings(root_path.as_deref(), override_settings);
        self.notifier().log_settings_events(&events).await;
        self.apply_settings(settings).await;
    }

    async fn apply_settings(&self, settings: WorkspaceSettings) {
        let previous = self.settings.swap(Arc::new(settings.clone()));
        self.provider
            .update_settings(ProviderSettings::from(&settings));

        let tsserver_changed = previous.tsserver != settings.tsserver;
        if tsserver_changed || self.tsserver.get().is_none() {
            self.start_tsserver(&settings.tsserver).await;
        }

        if *previous != settings {
            self.notifier().request_semantic_tokens_refresh();
        }
    }

    /// Start tsserver, hand it every open document, and retire the old one.
    async fn start_tsserver(&self, settings: &TsServerSettings) {
        let client = match TsServerClient::spawn(settings) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                log::warn!(
                    target: "ts_semantic_ls::lsp",
                    "Failed to start tsserver: {}",
                    err
                );
                self.notifier()
                    .log_warning(format!(
                        "Failed to start tsserver ({}); semantic tokens are unavailable",
                        err
                    ))
                    .await;
                return;
            }
        };

        if let Some(previous) = self.tsserver.install(client, &self.documents).await {
            tokio::spawn(async move {
                if let Err(err) = previous.exit().await {
                    log::debug!(
                        target: "ts_semantic_ls::lsp",
                        "Previous tsserver did not exit cleanly: {}",
                        err
                    );
                }
            });
        }

        self.notifier()
            .log_info(format!("Started tsserver: {}", settings.command.join(" ")))
            .await;
    }
}

/// Workspace root from the first workspace folder, or the deprecated root URI.
fn resolve_root_path(params: &InitializeParams) -> Option<PathBuf> {
    let folder_uri = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| folder.uri.clone());

    #[allow(deprecated)]
    let uri = folder_uri.or_else(|| params.root_uri.clone())?;

    uri_to_url(&uri).ok()?.to_file_path().ok()
}

fn server_capabilities(legend: &Legend) -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                ..Default::default()
            },
        )),
        semantic_tokens_provider: Some(SemanticTokensServerCapabilities::SemanticTokensOptions(
            SemanticTokensOptions {
                legend: legend.to_lsp(),
                full: Some(SemanticTokensFullOptions::Bool(true)),
                range: Some(true),
                ..Default::default()
            },
        )),
        ..ServerCapabilities::default()
    }
}

impl LanguageServer for TsSemanticLs {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let _ = self.client_capabilities.set(params.capabilities.clone());

        match resolve_root_path(&params) {
            Some(root) => {
                self.notifier()
                    .log_info(format!("Using workspace root: {}", root.display()))
                    .await;
                let _ = self.root_path.set(root);
            }
            None => {
                self.notifier()
                    .log_warning(
                        "Failed to determine workspace root - project config will not be loaded",
                    )
                    .await;
            }
        }

        let init_options = params
            .initialization_options
            .map(|options| (SettingsSource::InitializationOptions, options));
        self.reload_settings(init_options).await;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: server_capabilities(self.provider.legend()),
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.notifier().log_info("server is ready").await;
    }

    async fn shutdown(&self) -> Result<()> {
        self.semantic_request_tracker.cancel_all();
        if let Some(tsserver) = self.tsserver.take()
            && let Err(err) = tsserver.exit().await
        {
            log::warn!(
                target: "ts_semantic_ls::lsp",
                "tsserver did not exit cleanly: {}",
                err
            );
        }
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.did_open_impl(params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.did_change_impl(params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.did_close_impl(params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = (!params.settings.is_null())
            .then(|| (SettingsSource::ClientConfiguration, params.settings));
        self.reload_settings(settings).await;
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        self.semantic_tokens_full_impl(params).await
    }

    async fn semantic_tokens_range(
        &self,
        params: SemanticTokensRangeParams,
    ) -> Result<Option<SemanticTokensRangeResult>> {
        self.semantic_tokens_range_impl(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn uri_to_url_round_trips_file_uris() {
        let url = uri_to_url(&uri("file:///project/src/a.ts")).unwrap();
        assert_eq!(url.scheme(), "file");
        assert_eq!(url.path(), "/project/src/a.ts");
    }

    #[test]
    fn root_path_prefers_workspace_folders() {
        #[allow(deprecated)]
        let params = InitializeParams {
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: uri("file:///workspace"),
                name: "workspace".to_string(),
            }]),
            root_uri: Some(uri("file:///legacy")),
            ..Default::default()
        };
        assert_eq!(resolve_root_path(&params), Some(PathBuf::from("/workspace")));
    }

    #[test]
    fn root_path_falls_back_to_root_uri() {
        #[allow(deprecated)]
        let params = InitializeParams {
            root_uri: Some(uri("file:///legacy")),
            ..Default::default()
        };
        assert_eq!(resolve_root_path(&params), Some(PathBuf::from("/legacy")));
        assert_eq!(resolve_root_path(&InitializeParams::default()), None);
    }

    #[test]
    fn capabilities_publish_legend_full_and_range() {
        let capabilities = server_capabilities(&Legend::new());
        let Some(SemanticTokensServerCapabilities::SemanticTokensOptions(options)) =
            capabilities.semantic_tokens_provider
        else {
            panic!("semantic tokens options missing");
        };

        assert_eq!(options.legend.token_types.len(), 12);
        assert_eq!(options.legend.token_modifiers.len(), 6);
        assert_eq!(options.full, Some(SemanticTokensFullOptions::Bool(true)));
        assert_eq!(options.range, Some(true));

        let Some(TextDocumentSyncCapability::Options(sync)) = capabilities.text_document_sync
        else {
            panic!("text document sync missing");
        };
        assert_eq!(sync.change, Some(TextDocumentSyncKind::INCREMENTAL));
    }
}
