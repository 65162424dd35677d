//! Programmed defaults, the lowest configuration layer.

use super::settings::{BridgeSettings, TsServerConfig};
use crate::semantic::{DEFAULT_CONTENT_LENGTH_LIMIT, DEFAULT_SETTLE_INTERVAL};
use crate::service::ClassificationFormat;

pub const DEFAULT_TSSERVER_COMMAND: &str = "tsserver";

pub fn default_settings() -> BridgeSettings {
    BridgeSettings {
        tsserver: Some(TsServerConfig {
            command: Some(vec![DEFAULT_TSSERVER_COMMAND.to_string()]),
            args: Some(Vec::new()),
        }),
        content_length_limit: Some(DEFAULT_CONTENT_LENGTH_LIMIT),
        settle_interval_ms: Some(DEFAULT_SETTLE_INTERVAL.as_millis() as u64),
        classification_format: Some(ClassificationFormat::Packed2020),
    }
}
