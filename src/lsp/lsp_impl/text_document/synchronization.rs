//! Document synchronization: keep the store and tsserver in step with the client.
//!
//! Each handler holds the tsserver sync lock from the store update until
//! tsserver has been told, so a tsserver restart cannot slip in between.

use tower_lsp_server::ls_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
};

use super::super::{TsSemanticLs, uri_to_url};

impl TsSemanticLs {
    pub(crate) async fn did_open_impl(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        let Ok(uri) = uri_to_url(&document.uri) else {
            log::warn!(
                target: "ts_semantic_ls::sync",
                "Invalid URI in didOpen: {}",
                document.uri.as_str()
            );
            return;
        };

        let _sync = self.tsserver.lock_sync().await;
        self.documents.open(
            uri.clone(),
            document.text,
            document.version,
            Some(document.language_id),
        );

        let Some(snapshot) = self.documents.get(&uri).map(|doc| doc.snapshot()) else {
            return;
        };
        let (Some(path), Some(tsserver)) = (snapshot.file_path, self.tsserver.get()) else {
            return;
        };

        if let Err(err) = tsserver
            .open(&path, &snapshot.text, snapshot.script_kind)
            .await
        {
            log::warn!(
                target: "ts_semantic_ls::sync",
                "Failed to open {} in tsserver: {}",
                path.display(),
                err
            );
        }
    }

    pub(crate) async fn did_change_impl(&self, params: DidChangeTextDocumentParams) {
        let Ok(uri) = uri_to_url(&params.text_document.uri) else {
            log::warn!(
                target: "ts_semantic_ls::sync",
                "Invalid URI in didChange: {}",
                params.text_document.uri.as_str()
            );
            return;
        };

        let _sync = self.tsserver.lock_sync().await;
        let Some(edits) = self.documents.apply_changes(
            &uri,
            params.content_changes,
            params.text_document.version,
        ) else {
            self.notifier()
                .log_warning(format!("Document not found for change event: {uri}"))
                .await;
            return;
        };

        let path = self
            .documents
            .get(&uri)
            .and_then(|doc| doc.file_path().map(|path| path.to_path_buf()));
        let (Some(path), Some(tsserver)) = (path, self.tsserver.get()) else {
            return;
        };

        if let Err(err) = tsserver.change(&path, &edits).await {
            log::warn!(
                target: "ts_semantic_ls::sync",
                "Failed to forward change for {} to tsserver: {}",
                path.display(),
                err
            );
        }
    }

    pub(crate) async fn did_close_impl(&self, params: DidCloseTextDocumentParams) {
        let Ok(uri) = uri_to_url(&params.text_document.uri) else {
            return;
        };

        self.semantic_request_tracker.cancel_all_for_uri(&uri);
        let _sync = self.tsserver.lock_sync().await;
        let Some(document) = self.documents.remove(&uri) else {
            return;
        };

        let (Some(path), Some(tsserver)) = (document.file_path(), self.tsserver.get()) else {
            return;
        };
        if let Err(err) = tsserver.close(path).await {
            log::warn!(
                target: "ts_semantic_ls::sync",
                "Failed to close {} in tsserver: {}",
                path.display(),
                err
            );
        }
    }
}
