pub mod store;

pub(crate) mod model;

// Re-export main types
pub use model::{Document, DocumentSnapshot, DocumentVersion, ScriptKind};
pub use store::{DocumentHandle, DocumentStore, TextEdit};
