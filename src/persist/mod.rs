//! RON persistence for setting values.
//!
//! The file mirrors the command tree: one nested map per command that has
//! settings below it, one string per setting.
//!
//! ```ron
//! (
//!     settings: {
//!         "aim": {
//!             "fov": "90",
//!             "smooth": "true",
//!         },
//!     },
//! )
//! ```

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{CommandTree, SettingsTable};

/// Default settings file name.
pub const DEFAULT_SETTINGS_FILE: &str = "commands.ron";

/// Serializable settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SettingsFile {
    #[serde(default)]
    pub settings: SettingsTable,
}

impl SettingsFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every setting in the tree.
    pub fn from_tree(tree: &CommandTree) -> Self {
        Self {
            settings: tree.snapshot(),
        }
    }

    /// Load settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))?;

        ron::from_str(&contents)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))
    }

    /// Save settings to a RON file, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Io(parent.display().to_string(), e.to_string()))?;
        }

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(8)
            .enumerate_arrays(false);
        let contents = ron::ser::to_string_pretty(self, pretty)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e.to_string()))
    }

    /// Load settings, falling back to an empty file on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

/// Errors from reading or writing a settings file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// IO error (path, message).
    #[error("IO error for '{0}': {1}")]
    Io(String, String),
    /// Parse error (path, message).
    #[error("Parse error for '{0}': {1}")]
    Parse(String, String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}

/// Where the settings file lives.
#[derive(Resource, Debug, Clone)]
pub struct SettingsPath(pub String);

impl Default for SettingsPath {
    fn default() -> Self {
        Self(DEFAULT_SETTINGS_FILE.to_string())
    }
}

/// Push stored values into the tree.
pub fn apply_settings(file: &SettingsFile, tree: &mut CommandTree) {
    tree.restore(&file.settings);
}

/// Write the tree's current setting values to `path`.
pub fn save_settings(tree: &CommandTree, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    SettingsFile::from_tree(tree).save(path)?;
    info!("Saved settings to '{}'", path.display());
    Ok(())
}

/// Load the settings file once every command has been registered.
pub fn load_settings_on_startup(mut tree: ResMut<CommandTree>, path: Res<SettingsPath>) {
    let path = &path.0;

    if !Path::new(path).exists() {
        info!("No settings file found at '{}', using defaults", path);
        return;
    }

    match SettingsFile::load(path) {
        Ok(file) => {
            info!("Loading settings from '{}'", path);
            apply_settings(&file, &mut tree);
        }
        Err(e) => {
            error!("Failed to load settings: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CommandBuilder, CommandId, Setting};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tree() -> (CommandTree, CommandId, CommandId) {
        let mut tree = CommandTree::default();
        let aim = tree.build(CommandBuilder::new("aim").parent(CommandTree::GLOBAL)).unwrap();
        let fov = tree
            .build(CommandBuilder::new("fov").parent(aim).setting(Setting::new(90.0f32)))
            .unwrap();
        let target = tree
            .build(
                CommandBuilder::new("target")
                    .parent(aim)
                    .setting(Setting::new(String::from("closest"))),
            )
            .unwrap();
        (tree, fov, target)
    }

    #[test]
    fn test_settings_file_roundtrip() {
        let (mut source, fov, target) = tree();
        source.set_setting(fov, 65.5f32);
        source.set_setting(target, String::from("lowest health"));

        let temp = NamedTempFile::new().unwrap();
        save_settings(&source, temp.path()).unwrap();

        let loaded = SettingsFile::load(temp.path()).unwrap();
        assert_eq!(loaded, SettingsFile::from_tree(&source));

        let (mut fresh, fresh_fov, fresh_target) = tree();
        apply_settings(&loaded, &mut fresh);
        assert_eq!(fresh.setting::<f32>(fresh_fov), Some(65.5));
        assert_eq!(fresh.setting::<String>(fresh_target).as_deref(), Some("lowest health"));
    }

    #[test]
    fn test_load_missing() {
        let result = SettingsFile::load("nonexistent_settings.ron");
        assert!(matches!(result, Err(ConfigError::Io(..))));
        assert!(SettingsFile::load_or_default("nonexistent_settings.ron").settings.is_empty());
    }

    #[test]
    fn test_parse_ron() {
        let ron_content = r#"(
    settings: {
        "AIM": {
            "fov": "120",
        },
    },
)"#;

        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(ron_content.as_bytes()).unwrap();
        temp.flush().unwrap();

        let file = SettingsFile::load(temp.path()).unwrap();
        assert_eq!(file.settings.value("AIM.fov"), Some("120"));

        let (mut tree, fov, _) = tree();
        apply_settings(&file, &mut tree);
        assert_eq!(tree.setting::<f32>(fov), Some(120.0));
    }

    #[test]
    fn test_parse_error() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(b"(settings: [").unwrap();
        temp.flush().unwrap();
        assert!(matches!(SettingsFile::load(temp.path()), Err(ConfigError::Parse(..))));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("commands.ron");
        let (tree, _, _) = tree();

        save_settings(&tree, &path).unwrap();
        assert!(path.exists());
    }
}
