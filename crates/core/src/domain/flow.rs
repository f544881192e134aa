use serde::Deserialize;

use crate::domain::{non_empty, Fulfillment};

/// Page-id fragments the service uses for its built-in pages. No page row is
/// emitted for them, though routes may still target them.
pub const EXCLUDED_PAGE_MARKERS: &[&str] = &["START_PAGE", "END_SESSION", "END_FLOW"];

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Flow {
    pub name: String,
    pub display_name: String,
    pub transition_routes: Vec<TransitionRoute>,
    pub event_handlers: Vec<TransitionRoute>,
    pub transition_route_groups: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub name: String,
    pub display_name: String,
    pub entry_fulfillment: Option<Fulfillment>,
    pub form: Option<Form>,
    pub transition_routes: Vec<TransitionRoute>,
    pub event_handlers: Vec<TransitionRoute>,
    pub transition_route_groups: Vec<String>,
}

impl Page {
    pub fn is_builtin_marker(page_id: &str) -> bool {
        EXCLUDED_PAGE_MARKERS.iter().any(|marker| page_id.contains(marker))
    }

    pub fn form_parameters(&self) -> &[FormParameter] {
        self.form.as_ref().map(|form| form.parameters.as_slice()).unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Form {
    pub parameters: Vec<FormParameter>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormParameter {
    pub display_name: String,
    pub entity_type: String,
    pub required: bool,
    pub is_list: bool,
    pub redact: bool,
    pub fill_behavior: FillBehavior,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FillBehavior {
    pub initial_prompt_fulfillment: Option<Fulfillment>,
    pub reprompt_event_handlers: Vec<TransitionRoute>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteGroup {
    pub name: String,
    pub display_name: String,
    pub transition_routes: Vec<TransitionRoute>,
}

/// Ordinary transition route, event handler or reprompt handler.
///
/// Ordinary routes carry `intent` and/or `condition`; handlers carry `event`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionRoute {
    pub name: String,
    #[serde(deserialize_with = "non_empty")]
    pub intent: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub condition: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub event: Option<String>,
    pub trigger_fulfillment: Option<Fulfillment>,
    #[serde(deserialize_with = "non_empty")]
    pub target_page: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub target_flow: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteTarget<'a> {
    Flow(&'a str),
    Page(&'a str),
}

impl RouteTarget<'_> {
    pub fn id(&self) -> &str {
        match self {
            Self::Flow(id) | Self::Page(id) => id,
        }
    }
}

impl TransitionRoute {
    /// The flow target takes precedence when the upstream data carries both.
    pub fn target(&self) -> Option<RouteTarget<'_>> {
        match (self.target_flow.as_deref(), self.target_page.as_deref()) {
            (Some(flow), _) => Some(RouteTarget::Flow(flow)),
            (None, Some(page)) => Some(RouteTarget::Page(page)),
            (None, None) => None,
        }
    }

    pub fn has_conflicting_targets(&self) -> bool {
        self.target_flow.is_some() && self.target_page.is_some()
    }
}
