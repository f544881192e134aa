use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::non_empty;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Intent {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub parameters: Vec<IntentParameter>,
    pub labels: BTreeMap<String, String>,
    pub training_phrases: Vec<TrainingPhrase>,
}

impl Intent {
    pub fn parameter_entity_type(&self, parameter_id: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|parameter| parameter.id == parameter_id)
            .map(|parameter| parameter.entity_type.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntentParameter {
    pub id: String,
    pub entity_type: String,
    pub is_list: bool,
    pub redact: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrainingPhrase {
    pub id: String,
    pub parts: Vec<PhrasePart>,
    pub repeat_count: i32,
}

/// A run of phrase text, annotated when `parameter_id` is set.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhrasePart {
    pub text: String,
    #[serde(deserialize_with = "non_empty")]
    pub parameter_id: Option<String>,
}
