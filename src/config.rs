pub mod defaults;
pub mod settings;
pub mod user;

pub use settings::{BridgeSettings, TsServerConfig};
pub use user::{load_user_config, user_config_path};

use crate::semantic::{DEFAULT_CONTENT_LENGTH_LIMIT, DEFAULT_SETTLE_INTERVAL};
use crate::service::ClassificationFormat;
use defaults::{DEFAULT_TSSERVER_COMMAND, default_settings};

/// File name of the project config, looked up in the workspace root
pub const PROJECT_CONFIG_FILE_NAME: &str = "ts-semantic-ls.toml";

/// Resolved tsserver launch settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsServerSettings {
    pub command: Vec<String>,
    pub args: Vec<String>,
}

/// Fully resolved settings, every layer applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    pub tsserver: TsServerSettings,
    pub content_length_limit: u32,
    pub settle_interval_ms: u64,
    pub classification_format: ClassificationFormat,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        WorkspaceSettings::from(default_settings())
    }
}

/// Merge multiple BridgeSettings layers in order.
/// Later configs in the slice have higher precedence (override earlier ones).
/// Use this for layered config: `merge_all(&[defaults, user, project, session])`
pub fn merge_all(configs: &[Option<BridgeSettings>]) -> Option<BridgeSettings> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two BridgeSettings, preferring values from `primary` over `fallback`
pub fn merge_settings(
    fallback: Option<BridgeSettings>,
    primary: Option<BridgeSettings>,
) -> Option<BridgeSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) => Some(settings),
        (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(BridgeSettings {
            tsserver: merge_tsserver(fallback.tsserver, primary.tsserver),
            content_length_limit: primary
                .content_length_limit
                .or(fallback.content_length_limit),
            settle_interval_ms: primary.settle_interval_ms.or(fallback.settle_interval_ms),
            classification_format: primary
                .classification_format
                .or(fallback.classification_format),
        }),
    }
}

fn merge_tsserver(
    fallback: Option<TsServerConfig>,
    primary: Option<TsServerConfig>,
) -> Option<TsServerConfig> {
    match (fallback, primary) {
        (Some(fallback), Some(primary)) => Some(TsServerConfig {
            command: primary.command.or(fallback.command),
            args: primary.args.or(fallback.args),
        }),
        (fallback, primary) => primary.or(fallback),
    }
}

impl From<BridgeSettings> for WorkspaceSettings {
    fn from(settings: BridgeSettings) -> Self {
        let tsserver = settings.tsserver.unwrap_or_default();

        // An empty command cannot be spawned; treat it as unset
        let command = tsserver
            .command
            .filter(|command| !command.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_TSSERVER_COMMAND.to_string()]);

        WorkspaceSettings {
            tsserver: TsServerSettings {
                command,
                args: tsserver.args.unwrap_or_default(),
            },
            content_length_limit: settings
                .content_length_limit
                .unwrap_or(DEFAULT_CONTENT_LENGTH_LIMIT),
            settle_interval_ms: settings
                .settle_interval_ms
                .unwrap_or(DEFAULT_SETTLE_INTERVAL.as_millis() as u64),
            classification_format: settings.classification_format.unwrap_or_default(),
        }
    }
}
