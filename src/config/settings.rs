use serde::{Deserialize, Serialize};

use crate::service::ClassificationFormat;

/// How to launch tsserver, as written in a config layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TsServerConfig {
    /// Program and leading arguments, e.g. `["node", "/path/to/tsserver.js"]`
    pub command: Option<Vec<String>>,
    /// Extra arguments appended after `command`
    pub args: Option<Vec<String>>,
}

/// One configuration layer. Every field is optional so that layers can be
/// merged; see [`super::merge_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeSettings {
    pub tsserver: Option<TsServerConfig>,
    /// Largest document (or range) length, in UTF-16 code units, sent for classification
    pub content_length_limit: Option<u32>,
    /// Quiet period required before a changed document counts as settled
    pub settle_interval_ms: Option<u64>,
    pub classification_format: Option<ClassificationFormat>,
}
