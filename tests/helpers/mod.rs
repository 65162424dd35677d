//! Shared test helpers for E2E tests.
//!
//! `helpers/mod.rs` rather than `tests/helpers.rs`: Cargo would compile a
//! top-level file in `tests/` as a test binary of its own.

pub mod lsp_client;
pub mod lsp_polling;
