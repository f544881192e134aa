use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityType {
    pub name: String,
    pub display_name: String,
    pub kind: Option<String>,
    pub entities: Vec<Entity>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Entity {
    pub value: String,
    pub synonyms: Vec<String>,
}
