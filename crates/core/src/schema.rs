//! Fixed column schemas of the nine output tables.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAMESPACE: &str = "agent_structure";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    DateTime,
    String,
    Boolean,
    /// Ordered list of strings.
    Repeated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn column(name: &'static str, column_type: ColumnType) -> Column {
    Column { name, column_type }
}

use ColumnType::{Boolean, DateTime, Repeated, String as Str};

const INTENTS: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("intentId", Str),
    column("intentName", Str),
    column("description", Str),
    column("parameters", Repeated),
    column("labels", Repeated),
];

const TRAINING_PHRASES: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("intentId", Str),
    column("intentName", Str),
    column("phrase", Str),
    column("annotatedPhrase", Str),
];

const ENTITIES: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("entityTypeId", Str),
    column("entityTypeName", Str),
    column("entity", Str),
    column("synonym", Str),
];

const WEBHOOKS: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("webhookId", Str),
    column("webhookName", Str),
    column("timeout", Str),
    column("serviceDirectory", Str),
    column("url", Str),
];

const PAGES: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("flowId", Str),
    column("flowName", Str),
    column("pageId", Str),
    column("pageName", Str),
    column("webhookId", Str),
    column("webhookName", Str),
    column("webhookTag", Str),
    column("fulfillment", Repeated),
    column("partialResponse", Boolean),
    column("parameterPresets", Repeated),
    column("parameters", Repeated),
    column("routes", Repeated),
    column("routeGroups", Repeated),
];

const FLOWS: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("flowId", Str),
    column("flowName", Str),
    column("pages", Repeated),
];

const TRANSITION_ROUTES: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("flowId", Str),
    column("flowName", Str),
    column("pageId", Str),
    column("pageName", Str),
    column("transitionRouteId", Str),
    column("routeGroupId", Str),
    column("routeGroupName", Str),
    column("intentId", Str),
    column("intentName", Str),
    column("parameterId", Str),
    column("parameterName", Str),
    column("targetPageId", Str),
    column("targetPageName", Str),
    column("targetKind", Str),
    column("webhookId", Str),
    column("webhookName", Str),
    column("webhookTag", Str),
    column("event", Str),
    column("condition", Str),
    column("fulfillment", Repeated),
    column("partialResponse", Boolean),
    column("parameterPresets", Repeated),
];

const ROUTE_GROUPS: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("flowId", Str),
    column("flowName", Str),
    column("routeGroupId", Str),
    column("routeGroupName", Str),
    column("routes", Repeated),
];

const PARAMETERS: &[Column] = &[
    column("date", DateTime),
    column("agentId", Str),
    column("agentName", Str),
    column("flowId", Str),
    column("flowName", Str),
    column("pageId", Str),
    column("pageName", Str),
    column("parameterId", Str),
    column("parameterName", Str),
    column("entityId", Str),
    column("entityName", Str),
    column("webhookId", Str),
    column("webhookName", Str),
    column("webhookTag", Str),
    column("required", Boolean),
    column("isList", Boolean),
    column("redactInLog", Boolean),
    column("fulfillment", Repeated),
    column("partialResponse", Boolean),
    column("parameterPresets", Repeated),
    column("routes", Repeated),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableKind {
    Intents,
    TrainingPhrases,
    Entities,
    Webhooks,
    Pages,
    Flows,
    TransitionRoutes,
    RouteGroups,
    Parameters,
}

impl TableKind {
    pub const ALL: [TableKind; 9] = [
        TableKind::Intents,
        TableKind::TrainingPhrases,
        TableKind::Entities,
        TableKind::Webhooks,
        TableKind::Pages,
        TableKind::Flows,
        TableKind::TransitionRoutes,
        TableKind::RouteGroups,
        TableKind::Parameters,
    ];

    /// Row-set name used in logs and outcome messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Intents => "Intents",
            Self::TrainingPhrases => "TrainingPhrases",
            Self::Entities => "Entities",
            Self::Webhooks => "Webhooks",
            Self::Pages => "Pages",
            Self::Flows => "Flows",
            Self::TransitionRoutes => "TransitionRoutes",
            Self::RouteGroups => "RouteGroups",
            Self::Parameters => "Parameters",
        }
    }

    pub fn table_suffix(self) -> &'static str {
        match self {
            Self::Intents => "intents",
            Self::TrainingPhrases => "training_phrases",
            Self::Entities => "entity_types",
            Self::Webhooks => "webhooks",
            Self::Pages => "pages",
            Self::Flows => "flows",
            Self::TransitionRoutes => "transition_routes",
            Self::RouteGroups => "transition_route_groups",
            Self::Parameters => "parameters",
        }
    }

    /// Durable table path, `<namespace>.<suffix>`.
    pub fn table_path(self, namespace: &str) -> String {
        format!("{namespace}.{}", self.table_suffix())
    }

    pub fn columns(self) -> &'static [Column] {
        match self {
            Self::Intents => INTENTS,
            Self::TrainingPhrases => TRAINING_PHRASES,
            Self::Entities => ENTITIES,
            Self::Webhooks => WEBHOOKS,
            Self::Pages => PAGES,
            Self::Flows => FLOWS,
            Self::TransitionRoutes => TRANSITION_ROUTES,
            Self::RouteGroups => ROUTE_GROUPS,
            Self::Parameters => PARAMETERS,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{ColumnType, TableKind, DEFAULT_NAMESPACE};

    #[test]
    fn every_table_starts_with_the_snapshot_stamp() {
        for kind in TableKind::ALL {
            let names: Vec<&str> = kind.columns().iter().take(3).map(|c| c.name).collect();
            assert_eq!(names, ["date", "agentId", "agentName"], "{kind:?}");
            assert_eq!(kind.columns()[0].column_type, ColumnType::DateTime);
        }
    }

    #[test]
    fn column_names_are_unique_per_table() {
        for kind in TableKind::ALL {
            let unique: HashSet<&str> = kind.columns().iter().map(|c| c.name).collect();
            assert_eq!(unique.len(), kind.columns().len(), "{kind:?}");
        }
    }

    #[test]
    fn table_paths_use_the_reference_names() {
        assert_eq!(TableKind::Pages.table_path(DEFAULT_NAMESPACE), "agent_structure.pages");
        assert_eq!(
            TableKind::RouteGroups.table_path(DEFAULT_NAMESPACE),
            "agent_structure.transition_route_groups"
        );
        assert_eq!(TableKind::Entities.table_suffix(), "entity_types");
    }
}
