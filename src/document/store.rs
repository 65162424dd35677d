use crate::document::{Document, DocumentSnapshot, DocumentVersion, ScriptKind};
use crate::text::LineIndex;
use dashmap::DashMap;
use dashmap::mapref::one::Ref;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tower_lsp_server::ls_types::{Position, Range, TextDocumentContentChangeEvent};
use url::Url;

/// One applied content change, expressed against the text it was applied to.
///
/// Full-document replacements are reported as an edit spanning the whole
/// previous text so that downstream consumers only deal with ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

// The central store for all open documents.
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
}

pub struct DocumentHandle<'a> {
    inner: Ref<'a, Url, Document>,
}

impl<'a> DocumentHandle<'a> {
    fn new(inner: Ref<'a, Url, Document>) -> Self {
        Self { inner }
    }
}

impl<'a> Deref for DocumentHandle<'a> {
    type Target = Document;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly opened document.
    ///
    /// Reopening a URI that is still tracked replaces its text in place so
    /// that staleness guards waiting on the old content observe a change.
    pub fn open(
        &self,
        uri: Url,
        text: String,
        lsp_version: i32,
        language_id: Option<String>,
    ) {
        if let Some(mut doc) = self.documents.get_mut(&uri) {
            doc.update_text(text, Some(lsp_version));
            return;
        }

        let file_path = file_path_for(&uri);
        self.documents.insert(
            uri,
            Document::opened(text, lsp_version, language_id, file_path),
        );
    }

    pub fn get(&self, uri: &Url) -> Option<DocumentHandle<'_>> {
        self.documents.get(uri).map(DocumentHandle::new)
    }

    /// Take a snapshot and a version subscription under one entry guard
    pub fn snapshot(
        &self,
        uri: &Url,
    ) -> Option<(DocumentSnapshot, watch::Receiver<DocumentVersion>)> {
        self.documents
            .get(uri)
            .map(|doc| (doc.snapshot(), doc.subscribe()))
    }

    /// Apply `didChange` content changes in order.
    ///
    /// Returns the edits as applied (each relative to the text produced by the
    /// previous one), or `None` if the document is not open.
    pub fn apply_changes(
        &self,
        uri: &Url,
        changes: Vec<TextDocumentContentChangeEvent>,
        lsp_version: i32,
    ) -> Option<Vec<TextEdit>> {
        let mut doc = self.documents.get_mut(uri)?;

        let mut text = doc.text().to_string();
        let mut index = doc.line_index().clone();
        let mut applied = Vec::with_capacity(changes.len());

        for change in changes {
            let range = match change.range {
                Some(range) => range,
                None => Range {
                    start: Position::new(0, 0),
                    end: index.end_position(),
                },
            };

            let start = index.position_to_byte(&text, range.start);
            let end = index.position_to_byte(&text, range.end).max(start);
            text.replace_range(start..end, &change.text);
            index = LineIndex::new(&text);

            applied.push(TextEdit {
                range,
                new_text: change.text,
            });
        }

        doc.update_text(text, Some(lsp_version));
        Some(applied)
    }

    /// Local path, text and script kind of every open `file:` document
    pub fn open_files(&self) -> Vec<(PathBuf, Arc<str>, Option<ScriptKind>)> {
        self.documents
            .iter()
            .filter_map(|entry| {
                let snapshot = entry.snapshot();
                let path = snapshot.file_path?;
                Some((path, snapshot.text, snapshot.script_kind))
            })
            .collect()
    }

    pub fn remove(&self, uri: &Url) -> Option<Document> {
        self.documents.remove(uri).map(|(_, doc)| doc)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

fn file_path_for(uri: &Url) -> Option<PathBuf> {
    if uri.scheme() != "file" {
        return None;
    }
    uri.to_file_path().ok()
}
