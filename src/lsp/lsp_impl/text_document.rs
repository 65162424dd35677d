//! Text document related LSP methods.

mod semantic_tokens;
mod synchronization;
