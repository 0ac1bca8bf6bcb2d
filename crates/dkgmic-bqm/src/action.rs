//! Edit history record of an applied G'MIC command.

use serde::{Deserialize, Serialize};

use crate::engine::{InputMode, OutputMode};

/// Identifier of G'MIC actions in the host history.
pub const ACTION_IDENTIFIER: &str = "G'MIC-Qt";

/// Version of the action record layout.
pub const ACTION_VERSION: u32 = 1;

/// Value of an action parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionValue {
    /// Integer parameter.
    Int(i64),
    /// Text parameter.
    Text(String),
}

impl From<&str> for ActionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ActionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ActionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// A filter applied to an image, as stored in its edit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAction {
    /// Filter identifier.
    pub identifier: String,
    /// Record version.
    pub version: u32,
    /// Parameters in insertion order.
    pub parameters: Vec<(String, ActionValue)>,
}

impl FilterAction {
    /// Creates an action without parameters.
    pub fn new(identifier: impl Into<String>, version: u32) -> Self {
        Self {
            identifier: identifier.into(),
            version,
            parameters: Vec::new(),
        }
    }

    /// Appends a parameter.
    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<ActionValue>) {
        self.parameters.push((key.into(), value.into()));
    }

    /// First parameter named `key`.
    pub fn parameter(&self, key: &str) -> Option<&ActionValue> {
        self.parameters.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Builds the history record of a G'MIC run.
pub fn gmic_filter_action(
    command: &str,
    filter_path: &str,
    input_mode: InputMode,
    output_mode: OutputMode,
    filter_name: &str,
    engine_version: &str,
) -> FilterAction {
    let mut action = FilterAction::new(ACTION_IDENTIFIER, ACTION_VERSION);
    action.add_parameter("Command", command);
    action.add_parameter("FilterPath", filter_path);
    action.add_parameter("InputMode", input_mode as i64);
    action.add_parameter("OutputMode", output_mode as i64);
    action.add_parameter("FilterName", filter_name);
    action.add_parameter("GmicQtVersion", engine_version);
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmic_action_parameters() {
        let action = gmic_filter_action(
            "fx_sepia 1",
            "Portrait/Warm",
            InputMode::Active,
            OutputMode::InPlace,
            "Custom command (fx_sepia 1)",
            "3.4.0",
        );

        assert_eq!(action.identifier, "G'MIC-Qt");
        assert_eq!(action.version, 1);
        let keys: Vec<&str> = action.parameters.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            ["Command", "FilterPath", "InputMode", "OutputMode", "FilterName", "GmicQtVersion"]
        );
        assert_eq!(action.parameter("InputMode"), Some(&ActionValue::Int(1)));
        assert_eq!(action.parameter("FilterPath"), Some(&ActionValue::from("Portrait/Warm")));
        assert_eq!(action.parameter("missing"), None);
    }

    #[test]
    fn yaml_record() {
        let action = gmic_filter_action("negate", "", InputMode::Active, OutputMode::InPlace, "n", "3");
        let yaml = serde_yaml::to_string(&action).unwrap();
        let back: FilterAction = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, action);
    }
}
