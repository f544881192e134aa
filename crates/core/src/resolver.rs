//! Identifier → display-name lookups for every cross-referenced resource kind.
//!
//! Page and route-group ids are only unique inside their owning flow, so those
//! maps are keyed by flow id first. A miss never fails: the `*_label` helpers
//! fall back to the trailing segment of the id (or `Start` for the implicit
//! start page of a flow).

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{trailing_segment, AgentSnapshot, RouteTarget};

pub const START_PAGE_LABEL: &str = "Start";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceResolver {
    flows: HashMap<String, String>,
    pages: HashMap<String, HashMap<String, String>>,
    route_groups: HashMap<String, HashMap<String, String>>,
    webhooks: HashMap<String, String>,
    intents: HashMap<String, String>,
    entity_types: HashMap<String, String>,
}

impl ReferenceResolver {
    pub fn from_snapshot(snapshot: &AgentSnapshot) -> Self {
        let mut resolver = Self::default();

        for flow in &snapshot.flows {
            resolver.insert_flow(&flow.name, &flow.display_name);
        }
        for (flow_id, pages) in &snapshot.pages {
            for page in pages {
                resolver.insert_page(flow_id, &page.name, &page.display_name);
            }
        }
        for (flow_id, groups) in &snapshot.route_groups {
            for group in groups {
                resolver.insert_route_group(flow_id, &group.name, &group.display_name);
            }
        }
        for webhook in &snapshot.webhooks {
            resolver.insert_webhook(&webhook.name, &webhook.display_name);
        }
        for intent in &snapshot.intents {
            resolver.insert_intent(&intent.name, &intent.display_name);
        }
        for entity_type in &snapshot.entity_types {
            resolver.insert_entity_type(&entity_type.name, &entity_type.display_name);
        }

        debug!(
            event_name = "resolver.built",
            flows = resolver.flows.len(),
            webhooks = resolver.webhooks.len(),
            intents = resolver.intents.len(),
            entity_types = resolver.entity_types.len(),
            "reference maps built"
        );
        resolver
    }

    pub fn insert_flow(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.flows.insert(id.into(), name.into());
    }

    pub fn insert_page(
        &mut self,
        flow_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) {
        self.pages.entry(flow_id.into()).or_default().insert(id.into(), name.into());
    }

    pub fn insert_route_group(
        &mut self,
        flow_id: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) {
        self.route_groups.entry(flow_id.into()).or_default().insert(id.into(), name.into());
    }

    pub fn insert_webhook(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.webhooks.insert(id.into(), name.into());
    }

    pub fn insert_intent(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.intents.insert(id.into(), name.into());
    }

    pub fn insert_entity_type(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.entity_types.insert(id.into(), name.into());
    }

    pub fn flow_name(&self, id: &str) -> Option<&str> {
        self.flows.get(id).map(String::as_str)
    }

    pub fn page_name(&self, flow_id: &str, page_id: &str) -> Option<&str> {
        self.pages.get(flow_id).and_then(|pages| pages.get(page_id)).map(String::as_str)
    }

    pub fn route_group_name(&self, flow_id: &str, route_group_id: &str) -> Option<&str> {
        self.route_groups
            .get(flow_id)
            .and_then(|groups| groups.get(route_group_id))
            .map(String::as_str)
    }

    pub fn webhook_name(&self, id: &str) -> Option<&str> {
        self.webhooks.get(id).map(String::as_str)
    }

    pub fn intent_name(&self, id: &str) -> Option<&str> {
        self.intents.get(id).map(String::as_str)
    }

    pub fn entity_type_name(&self, id: &str) -> Option<&str> {
        self.entity_types.get(id).map(String::as_str)
    }

    pub fn flow_label(&self, id: &str) -> String {
        or_trailing_segment(self.flow_name(id), "flow", id)
    }

    pub fn webhook_label(&self, id: &str) -> String {
        or_trailing_segment(self.webhook_name(id), "webhook", id)
    }

    pub fn intent_label(&self, id: &str) -> String {
        or_trailing_segment(self.intent_name(id), "intent", id)
    }

    pub fn entity_type_label(&self, id: &str) -> String {
        or_trailing_segment(self.entity_type_name(id), "entity_type", id)
    }

    pub fn route_group_label(&self, flow_id: &str, route_group_id: &str) -> String {
        or_trailing_segment(
            self.route_group_name(flow_id, route_group_id),
            "route_group",
            route_group_id,
        )
    }

    /// Name of the page a row sits on. Any page id not in the flow's page map is
    /// the flow's implicit start page.
    pub fn page_context_label(&self, flow_id: &str, page_id: Option<&str>) -> Option<String> {
        page_id.map(|page_id| self.page_label(flow_id, page_id))
    }

    pub fn page_label(&self, flow_id: &str, page_id: &str) -> String {
        self.page_name(flow_id, page_id).unwrap_or(START_PAGE_LABEL).to_string()
    }

    pub fn target_label(&self, flow_id: &str, target: RouteTarget<'_>) -> String {
        match target {
            RouteTarget::Flow(id) => self.flow_label(id),
            RouteTarget::Page(id) => {
                or_trailing_segment(self.page_name(flow_id, id), "target_page", id)
            }
        }
    }
}

fn or_trailing_segment(found: Option<&str>, kind: &'static str, id: &str) -> String {
    match found {
        Some(name) => name.to_string(),
        None => {
            debug!(
                event_name = "resolver.fallback_name",
                kind,
                id,
                "reference not found in resolver map; using trailing id segment"
            );
            trailing_segment(id).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ReferenceResolver, START_PAGE_LABEL};
    use crate::domain::{AgentSnapshot, RouteTarget};

    const FLOW: &str = "projects/p/locations/global/agents/a/flows/main";

    fn resolver() -> ReferenceResolver {
        let snapshot: AgentSnapshot = serde_json::from_value(json!({
            "flows": [{"name": FLOW, "displayName": "Default Start Flow"}],
            "pages": {FLOW: [{"name": format!("{FLOW}/pages/p1"), "displayName": "Collect Email"}]},
            "routeGroups": {FLOW: [{"name": format!("{FLOW}/transitionRouteGroups/g1"), "displayName": "Small Talk"}]},
            "webhooks": [{"name": "agents/a/webhooks/w1", "displayName": "orders"}],
            "intents": [{"name": "agents/a/intents/i1", "displayName": "order.status"}],
            "entityTypes": [{"name": "agents/a/entityTypes/e1", "displayName": "size"}]
        }))
        .expect("snapshot");
        ReferenceResolver::from_snapshot(&snapshot)
    }

    #[test]
    fn known_ids_resolve_to_display_names() {
        let resolver = resolver();
        assert_eq!(resolver.flow_label(FLOW), "Default Start Flow");
        assert_eq!(resolver.route_group_label(FLOW, &format!("{FLOW}/transitionRouteGroups/g1")), "Small Talk");
        assert_eq!(resolver.webhook_label("agents/a/webhooks/w1"), "orders");
        assert_eq!(resolver.intent_label("agents/a/intents/i1"), "order.status");
        assert_eq!(resolver.entity_type_label("agents/a/entityTypes/e1"), "size");
    }

    #[test]
    fn page_ids_are_scoped_to_their_flow() {
        let resolver = resolver();
        let page = format!("{FLOW}/pages/p1");
        assert_eq!(resolver.page_name(FLOW, &page), Some("Collect Email"));
        assert_eq!(resolver.page_name("projects/p/locations/global/agents/a/flows/other", &page), None);
    }

    #[test]
    fn missing_target_page_falls_back_to_trailing_segment() {
        let resolver = resolver();
        let target = format!("{FLOW}/pages/END_SESSION");
        assert_eq!(resolver.target_label(FLOW, RouteTarget::Page(&target)), "END_SESSION");
        assert_eq!(
            resolver.target_label(FLOW, RouteTarget::Flow("agents/a/flows/unknown")),
            "unknown"
        );
    }

    #[test]
    fn unknown_page_context_is_the_start_page() {
        let resolver = resolver();
        assert_eq!(resolver.page_context_label(FLOW, Some(FLOW)).as_deref(), Some(START_PAGE_LABEL));
        assert_eq!(resolver.page_context_label(FLOW, None), None);
    }

    #[test]
    fn maps_can_be_supplied_without_a_snapshot() {
        let mut resolver = ReferenceResolver::default();
        resolver.insert_intent("intents/greet", "greeting");
        assert_eq!(resolver.intent_name("intents/greet"), Some("greeting"));
        assert_eq!(resolver.intent_label("intents/bye"), "bye");
    }
}
