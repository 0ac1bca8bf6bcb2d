//! Persisted settings of the G'MIC batch tool.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use dkgmic_filters::FilterManager;

use crate::error::BqmResult;

/// Settings file name under the config directory.
pub const SETTINGS_FILE_NAME: &str = "bqm.yaml";

/// Default settings location: `<config dir>/dkgmic/bqm.yaml`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dkgmic").join(SETTINGS_FILE_NAME))
}

/// Command and filter path selected for the batch tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Chained G'MIC command of the selected filter.
    #[serde(rename = "GmicBqmToolCommand", default)]
    pub command: String,
    /// Current path of the selected filter.
    #[serde(rename = "GmicBqmToolPath", default)]
    pub path: String,
}

impl ToolSettings {
    /// Settings reflecting the manager's current selection.
    pub fn from_selection(manager: &FilterManager) -> Self {
        Self {
            command: manager.current_command(),
            path: manager.current_path().to_string(),
        }
    }

    /// Parses settings from YAML.
    pub fn from_yaml(text: &str) -> BqmResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Serializes settings to YAML.
    pub fn to_yaml(&self) -> BqmResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Loads settings, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> BqmResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no tool settings, using defaults");
            return Ok(Self::default());
        }
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Saves settings, creating parent directories.
    pub fn save(&self, path: &Path) -> BqmResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_yaml()?)?;
        debug!(path = %path.display(), "saved tool settings");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dkgmic_filters::{FilterCommands, Node};

    #[test]
    fn yaml_keys() {
        let settings = ToolSettings {
            command: "fx_sepia 1".into(),
            path: "Portrait/Warm".into(),
        };
        let yaml = settings.to_yaml().unwrap();
        assert!(yaml.contains("GmicBqmToolCommand: fx_sepia 1"));
        assert!(yaml.contains("GmicBqmToolPath: Portrait/Warm"));
        assert_eq!(ToolSettings::from_yaml(&yaml).unwrap(), settings);

        let partial = ToolSettings::from_yaml("GmicBqmToolPath: x\n").unwrap();
        assert_eq!(partial.command, "");
        assert!(ToolSettings::from_yaml("[1, 2").is_err());
    }

    #[test]
    fn load_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        assert_eq!(ToolSettings::load(&path).unwrap(), ToolSettings::default());

        let settings = ToolSettings {
            command: "negate".into(),
            path: "Folder".into(),
        };
        settings.save(&path).unwrap();
        assert_eq!(ToolSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn from_manager_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut mgr = FilterManager::new(dir.path().join("gmicfilters.xml"));
        let rf = mgr.commands();
        let rf = mgr.tree().root_folder().unwrap_or(rf);

        let commands: FilterCommands = [("a", "fx_a 1"), ("b", "fx_b 2")].into_iter().collect();
        let item = mgr.create_entry(Node::item("Warm", commands));
        mgr.add_entry(rf, item, None);
        mgr.set_current_path("Warm");

        let settings = ToolSettings::from_selection(&mgr);
        assert_eq!(settings.command, "fx_a 1 fx_b 2");
        assert_eq!(settings.path, "Warm");
    }
}
