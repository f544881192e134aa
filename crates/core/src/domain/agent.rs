use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{EntityType, Flow, Intent, Page, RouteGroup, Webhook};

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentInfo {
    pub name: String,
    pub display_name: String,
}

/// Everything fetched for one agent before flattening starts.
///
/// Pages and route groups are keyed by the id of the flow that owns them.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSnapshot {
    pub agent: AgentInfo,
    pub flows: Vec<Flow>,
    pub pages: BTreeMap<String, Vec<Page>>,
    pub route_groups: BTreeMap<String, Vec<RouteGroup>>,
    pub webhooks: Vec<Webhook>,
    pub intents: Vec<Intent>,
    pub entity_types: Vec<EntityType>,
}

impl AgentSnapshot {
    pub fn pages_for(&self, flow_id: &str) -> &[Page] {
        self.pages.get(flow_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn route_groups_for(&self, flow_id: &str) -> &[RouteGroup] {
        self.route_groups.get(flow_id).map(Vec::as_slice).unwrap_or_default()
    }
}
