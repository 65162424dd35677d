use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use crate::text::LineIndex;

/// Opaque change counter for one open document.
///
/// Bumped on every content change; only ever compared for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentVersion(u64);

impl DocumentVersion {
    pub(crate) fn initial() -> Self {
        Self(0)
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// tsserver script kind, derived from the language id or the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Ts,
    Tsx,
    Js,
    Jsx,
}

impl ScriptKind {
    pub fn detect(language_id: Option<&str>, path: Option<&std::path::Path>) -> Option<Self> {
        let by_language = language_id.and_then(|id| match id {
            "typescript" => Some(ScriptKind::Ts),
            "typescriptreact" => Some(ScriptKind::Tsx),
            "javascript" => Some(ScriptKind::Js),
            "javascriptreact" => Some(ScriptKind::Jsx),
            _ => None,
        });

        by_language.or_else(|| {
            let extension = path?.extension()?.to_str()?;
            match extension {
                "ts" | "mts" | "cts" => Some(ScriptKind::Ts),
                "tsx" => Some(ScriptKind::Tsx),
                "js" | "mjs" | "cjs" => Some(ScriptKind::Js),
                "jsx" => Some(ScriptKind::Jsx),
                _ => None,
            }
        })
    }

    /// Name used by tsserver's `scriptKindName` argument
    pub fn as_tsserver_name(self) -> &'static str {
        match self {
            ScriptKind::Ts => "TS",
            ScriptKind::Tsx => "TSX",
            ScriptKind::Js => "JS",
            ScriptKind::Jsx => "JSX",
        }
    }
}

/// Open document: text, line table and change tracking
pub struct Document {
    text: Arc<str>,
    line_index: Arc<LineIndex>,
    version: DocumentVersion,
    lsp_version: Option<i32>,
    language_id: Option<String>,
    file_path: Option<PathBuf>,
    /// Broadcasts `version` to staleness guards waiting on this document
    version_tx: watch::Sender<DocumentVersion>,
}

impl Document {
    /// Create a new document with just text
    pub fn new(text: String) -> Self {
        let version = DocumentVersion::initial();
        let (version_tx, _) = watch::channel(version);
        Self {
            line_index: Arc::new(LineIndex::new(&text)),
            text: Arc::from(text),
            version,
            lsp_version: None,
            language_id: None,
            file_path: None,
            version_tx,
        }
    }

    /// Create a document as announced by `didOpen`
    pub fn opened(
        text: String,
        lsp_version: i32,
        language_id: Option<String>,
        file_path: Option<PathBuf>,
    ) -> Self {
        let mut doc = Self::new(text);
        doc.lsp_version = Some(lsp_version);
        doc.language_id = language_id;
        doc.file_path = file_path;
        doc
    }

    /// Get the text content
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    pub fn version(&self) -> DocumentVersion {
        self.version
    }

    /// Version number sent by the client, if any
    pub fn lsp_version(&self) -> Option<i32> {
        self.lsp_version
    }

    /// Get the language ID
    pub fn language_id(&self) -> Option<&str> {
        self.language_id.as_deref()
    }

    /// Local file path for `file:` documents
    pub fn file_path(&self) -> Option<&std::path::Path> {
        self.file_path.as_deref()
    }

    pub fn script_kind(&self) -> Option<ScriptKind> {
        ScriptKind::detect(self.language_id(), self.file_path())
    }

    /// Subscribe to version changes of this document.
    ///
    /// The receiver observes `Err` on `changed()` once the document is dropped.
    pub fn subscribe(&self) -> watch::Receiver<DocumentVersion> {
        self.version_tx.subscribe()
    }

    /// Replace the text, bump the version and notify subscribers
    pub fn update_text(&mut self, text: String, lsp_version: Option<i32>) {
        self.line_index = Arc::new(LineIndex::new(&text));
        self.text = Arc::from(text);
        if lsp_version.is_some() {
            self.lsp_version = lsp_version;
        }
        self.version = self.version.next();
        self.version_tx.send_replace(self.version);
    }

    /// Immutable view of the current state
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            text: Arc::clone(&self.text),
            line_index: Arc::clone(&self.line_index),
            version: self.version,
            file_path: self.file_path.clone(),
            script_kind: self.script_kind(),
        }
    }

    /// Get the length in UTF-16 code units
    pub fn len_utf16(&self) -> u32 {
        self.line_index.len_utf16()
    }

    /// Check if the document is empty
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Immutable view of a document at one version.
///
/// Offsets in a classification response are resolved against the snapshot
/// that was current when the request was dispatched.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub text: Arc<str>,
    pub line_index: Arc<LineIndex>,
    pub version: DocumentVersion,
    pub file_path: Option<PathBuf>,
    pub script_kind: Option<ScriptKind>,
}
