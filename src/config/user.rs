//! User configuration loading.
//!
//! User config location: $XDG_CONFIG_HOME/ts-semantic-ls/ts-semantic-ls.toml
//! Fallback: the platform config directory (`~/.config` on Linux)

use std::fs;
use std::path::PathBuf;

use super::settings::BridgeSettings;
use crate::error::{BridgeError, BridgeResult};

pub const CONFIG_DIR_NAME: &str = "ts-semantic-ls";
pub const CONFIG_FILE_NAME: &str = "ts-semantic-ls.toml";

/// Returns the path to the user configuration file.
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg_config) if !xdg_config.is_empty() => PathBuf::from(xdg_config),
        _ => dirs::config_dir()?,
    };
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load the user config, if one exists.
///
/// A missing file is `Ok(None)`; an unreadable or invalid one is an error.
pub fn load_user_config() -> BridgeResult<Option<BridgeSettings>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|e| BridgeError::config(format!("{}: {}", path.display(), e)))
}
