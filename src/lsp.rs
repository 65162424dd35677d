mod client;
mod lsp_impl;
mod semantic_request_tracker;
mod settings;

pub use lsp_impl::TsSemanticLs;
pub use semantic_request_tracker::{SemanticRequestTracker, TrackedRequest};
pub use settings::{
    SETTINGS_SECTION, SettingsEvent, SettingsEventKind, SettingsLoadOutcome, SettingsSource,
    load_settings,
};
