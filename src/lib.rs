pub mod classification;
pub mod config;
pub mod document;
pub mod error;
pub mod lsp;
pub mod projection;
pub mod semantic;
pub mod service;
pub mod staleness;
pub mod text;
pub mod tsserver;

pub use classification::{Legend, TokenModifier, TokenType};
pub use config::WorkspaceSettings;
pub use document::{DocumentSnapshot, DocumentStore, DocumentVersion};
pub use error::{BridgeError, BridgeResult};
pub use semantic::{NoTokensReason, ProviderSettings, SemanticTokensProvider, TokensOutcome};
pub use service::{
    ClassificationFormat, ClassificationRequest, ClassificationResponse, ClassificationService,
};

// Re-export the main server implementation
pub use lsp::TsSemanticLs;
