use crate::config::{
    BridgeSettings, PROJECT_CONFIG_FILE_NAME, WorkspaceSettings, defaults::default_settings,
    load_user_config, merge_all,
};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Key under which clients may nest our settings in `workspace/configuration`
/// style payloads, e.g. `{ "tsSemanticLs": { ... } }`
pub const SETTINGS_SECTION: &str = "tsSemanticLs";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSource {
    InitializationOptions,
    ClientConfiguration,
}

impl SettingsSource {
    fn description(self) -> &'static str {
        match self {
            SettingsSource::InitializationOptions => "initialization options",
            SettingsSource::ClientConfiguration => "client configuration",
        }
    }
}

#[derive(Default, Debug)]
pub struct SettingsLoadOutcome {
    pub settings: WorkspaceSettings,
    pub events: Vec<SettingsEvent>,
}

pub fn load_settings(
    root_path: Option<&Path>,
    override_settings: Option<(SettingsSource, Value)>,
) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    // Layer 1: Programmed defaults (lowest precedence)
    let defaults = Some(default_settings());

    // Layer 2: User config from XDG_CONFIG_HOME
    let user_config = load_user_config_with_events(&mut events);

    // Layer 3: Project config from root_path/ts-semantic-ls.toml
    let project_settings = load_toml_settings(root_path, &mut events);

    // Layer 4: Initialization options or client configuration
    let override_settings = override_settings
        .and_then(|(source, value)| parse_override_settings(source, value, &mut events));

    let merged = merge_all(&[defaults, user_config, project_settings, override_settings]);
    let settings = merged.map(WorkspaceSettings::from).unwrap_or_default();

    SettingsLoadOutcome { settings, events }
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<BridgeSettings> {
    match load_user_config() {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info("Loaded user config"));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_toml_settings(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<BridgeSettings> {
    let root = root_path?;
    let config_path = root.join(PROJECT_CONFIG_FILE_NAME);
    if !config_path.exists() {
        return None;
    }

    events.push(SettingsEvent::info(format!(
        "Found config file: {}",
        config_path.display()
    )));

    match fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<BridgeSettings>(&contents) {
            Ok(settings) => {
                events.push(SettingsEvent::info(format!(
                    "Successfully loaded {}",
                    PROJECT_CONFIG_FILE_NAME
                )));
                Some(settings)
            }
            Err(err) => {
                events.push(SettingsEvent::warning(format!(
                    "Failed to parse {}: {}",
                    PROJECT_CONFIG_FILE_NAME, err
                )));
                None
            }
        },
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to read {}: {}",
                PROJECT_CONFIG_FILE_NAME, err
            )));
            None
        }
    }
}

fn parse_override_settings(
    source: SettingsSource,
    value: Value,
    events: &mut Vec<SettingsEvent>,
) -> Option<BridgeSettings> {
    if value.is_null() {
        return None;
    }

    let value = match value {
        Value::Object(mut map) if map.contains_key(SETTINGS_SECTION) => {
            map.remove(SETTINGS_SECTION).unwrap_or(Value::Null)
        }
        other => other,
    };

    match serde_json::from_value::<BridgeSettings>(value) {
        Ok(settings) => {
            events.push(SettingsEvent::info(format!(
                "Parsed {} as settings",
                source.description()
            )));
            Some(settings)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to parse {}: {}",
                source.description(),
                err
            )));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ClassificationFormat;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    /// Points XDG_CONFIG_HOME at a temp dir for the lifetime of the guard
    struct UserConfigDir {
        _dir: TempDir,
        original: Option<std::ffi::OsString>,
    }

    impl UserConfigDir {
        fn new(contents: Option<&str>) -> Self {
            let dir = TempDir::new().expect("failed to create user config temp dir");
            if let Some(contents) = contents {
                let config_dir = dir.path().join("ts-semantic-ls");
                fs::create_dir_all(&config_dir).expect("failed to create config dir");
                fs::write(config_dir.join("ts-semantic-ls.toml"), contents)
                    .expect("failed to write user config");
            }

            let original = env::var_os("XDG_CONFIG_HOME");
            // SAFETY: #[serial(xdg_env)] prevents concurrent modification of XDG_CONFIG_HOME
            unsafe { env::set_var("XDG_CONFIG_HOME", dir.path()) };
            Self {
                _dir: dir,
                original,
            }
        }
    }

    impl Drop for UserConfigDir {
        fn drop(&mut self) {
            // SAFETY: #[serial(xdg_env)] prevents concurrent modification of XDG_CONFIG_HOME
            unsafe {
                match self.original.take() {
                    Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                    None => env::remove_var("XDG_CONFIG_HOME"),
                }
            }
        }
    }

    fn project_with(contents: &str) -> TempDir {
        let project_dir = TempDir::new().expect("failed to create project temp dir");
        fs::write(project_dir.path().join(PROJECT_CONFIG_FILE_NAME), contents)
            .expect("failed to write project config");
        project_dir
    }

    #[test]
    #[serial(xdg_env)]
    fn test_load_settings_without_any_config_uses_defaults() {
        let _user = UserConfigDir::new(None);
        let outcome = load_settings(None, None);

        assert_eq!(outcome.settings, WorkspaceSettings::default());
        assert!(outcome.events.is_empty());
    }

    #[test]
    #[serial(xdg_env)]
    fn test_load_settings_merges_user_config_with_project() {
        let _user = UserConfigDir::new(Some(
            r#"
                contentLengthLimit = 5000
                settleIntervalMs = 100
            "#,
        ));
        let project = project_with("contentLengthLimit = 7000");

        let outcome = load_settings(Some(project.path()), None);

        // project overrides user, user overrides defaults
        assert_eq!(outcome.settings.content_length_limit, 7000);
        assert_eq!(outcome.settings.settle_interval_ms, 100);
        assert_eq!(
            outcome.settings.classification_format,
            ClassificationFormat::Packed2020
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn test_load_settings_override_has_highest_precedence() {
        let _user = UserConfigDir::new(Some("classificationFormat = \"2020\""));
        let project = project_with("classificationFormat = \"2020\"");

        let outcome = load_settings(
            Some(project.path()),
            Some((
                SettingsSource::InitializationOptions,
                serde_json::json!({ "classificationFormat": "original" }),
            )),
        );

        assert_eq!(
            outcome.settings.classification_format,
            ClassificationFormat::Original
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn test_client_configuration_may_be_nested_in_section() {
        let _user = UserConfigDir::new(None);
        let outcome = load_settings(
            None,
            Some((
                SettingsSource::ClientConfiguration,
                serde_json::json!({
                    "tsSemanticLs": { "tsserver": { "args": ["--locale", "en"] } }
                }),
            )),
        );

        assert_eq!(
            outcome.settings.tsserver.args,
            vec!["--locale".to_string(), "en".to_string()]
        );
        assert_eq!(outcome.settings.tsserver.command, vec!["tsserver".to_string()]);
    }

    #[test]
    #[serial(xdg_env)]
    fn test_load_settings_logs_user_config_events() {
        let _user = UserConfigDir::new(Some("settleIntervalMs = 50"));
        let outcome = load_settings(None, None);

        assert!(
            outcome
                .events
                .iter()
                .any(|e| e.kind == SettingsEventKind::Info && e.message.contains("user config")),
            "Events: {:?}",
            outcome.events
        );
    }

    #[test]
    #[serial(xdg_env)]
    fn test_invalid_layers_warn_and_are_skipped() {
        let _user = UserConfigDir::new(None);
        let project = project_with("contentLengthLimit = [");

        let outcome = load_settings(
            Some(project.path()),
            Some((
                SettingsSource::ClientConfiguration,
                serde_json::json!({ "settleIntervalMs": "soon" }),
            )),
        );

        let warnings: Vec<_> = outcome
            .events
            .iter()
            .filter(|e| e.kind == SettingsEventKind::Warning)
            .collect();
        assert_eq!(warnings.len(), 2, "Events: {:?}", outcome.events);
        assert!(warnings[1].message.contains("client configuration"));
        assert_eq!(outcome.settings, WorkspaceSettings::default());
    }
}
