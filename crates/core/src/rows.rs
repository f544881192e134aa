//! Output rows, one struct per table.
//!
//! Rows are plain records: built once by the flatteners, never mutated, and
//! handed to a writer as a [`RowSets`] bundle. Serialized field names are the
//! column names of [`crate::schema`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flatten::SnapshotContext;
use crate::schema::TableKind;

/// One column value, in the order given by [`TableKind::columns`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Timestamp(DateTime<Utc>),
    Text(Option<String>),
    Flag(bool),
    List(Vec<String>),
}

impl Cell {
    fn text(value: &str) -> Self {
        Self::Text(Some(value.to_string()))
    }

    fn maybe(value: &Option<String>) -> Self {
        Self::Text(value.clone())
    }

    fn list(values: &[String]) -> Self {
        Self::List(values.to_vec())
    }
}

pub trait TableRow: Serialize {
    const TABLE: TableKind;

    fn cells(&self) -> Vec<Cell>;
}

impl SnapshotContext {
    fn stamp_cells(&self) -> [Cell; 3] {
        [Cell::Timestamp(self.snapshot_at), Cell::text(&self.agent_id), Cell::text(&self.agent_name)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Page,
    Flow,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Flow => "flow",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub flow_id: String,
    pub flow_name: String,
    pub pages: Vec<String>,
}

impl TableRow for FlowRow {
    const TABLE: TableKind = TableKind::Flows;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([Cell::text(&self.flow_id), Cell::text(&self.flow_name), Cell::list(&self.pages)]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub flow_id: String,
    pub flow_name: String,
    pub page_id: String,
    pub page_name: String,
    pub webhook_id: Option<String>,
    pub webhook_name: Option<String>,
    pub webhook_tag: Option<String>,
    pub fulfillment: Vec<String>,
    pub partial_response: bool,
    pub parameter_presets: Vec<String>,
    pub parameters: Vec<String>,
    pub routes: Vec<String>,
    pub route_groups: Vec<String>,
}

impl TableRow for PageRow {
    const TABLE: TableKind = TableKind::Pages;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.flow_id),
            Cell::text(&self.flow_name),
            Cell::text(&self.page_id),
            Cell::text(&self.page_name),
            Cell::maybe(&self.webhook_id),
            Cell::maybe(&self.webhook_name),
            Cell::maybe(&self.webhook_tag),
            Cell::list(&self.fulfillment),
            Cell::Flag(self.partial_response),
            Cell::list(&self.parameter_presets),
            Cell::list(&self.parameters),
            Cell::list(&self.routes),
            Cell::list(&self.route_groups),
        ]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub flow_id: String,
    pub flow_name: String,
    pub page_id: String,
    pub page_name: String,
    pub parameter_id: String,
    pub parameter_name: String,
    pub entity_id: String,
    pub entity_name: String,
    pub webhook_id: Option<String>,
    pub webhook_name: Option<String>,
    pub webhook_tag: Option<String>,
    pub required: bool,
    pub is_list: bool,
    pub redact_in_log: bool,
    pub fulfillment: Vec<String>,
    pub partial_response: bool,
    pub parameter_presets: Vec<String>,
    pub routes: Vec<String>,
}

impl TableRow for ParameterRow {
    const TABLE: TableKind = TableKind::Parameters;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.flow_id),
            Cell::text(&self.flow_name),
            Cell::text(&self.page_id),
            Cell::text(&self.page_name),
            Cell::text(&self.parameter_id),
            Cell::text(&self.parameter_name),
            Cell::text(&self.entity_id),
            Cell::text(&self.entity_name),
            Cell::maybe(&self.webhook_id),
            Cell::maybe(&self.webhook_name),
            Cell::maybe(&self.webhook_tag),
            Cell::Flag(self.required),
            Cell::Flag(self.is_list),
            Cell::Flag(self.redact_in_log),
            Cell::list(&self.fulfillment),
            Cell::Flag(self.partial_response),
            Cell::list(&self.parameter_presets),
            Cell::list(&self.routes),
        ]);
        cells
    }
}

/// One ordinary route, event handler or reprompt handler.
///
/// `target_page_id`/`target_page_name` hold the resolved target whether it is a
/// page or a flow; `target_kind` says which.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRouteRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub flow_id: String,
    pub flow_name: String,
    pub page_id: Option<String>,
    pub page_name: Option<String>,
    pub transition_route_id: String,
    pub route_group_id: Option<String>,
    pub route_group_name: Option<String>,
    pub intent_id: Option<String>,
    pub intent_name: Option<String>,
    pub parameter_id: Option<String>,
    pub parameter_name: Option<String>,
    pub target_page_id: Option<String>,
    pub target_page_name: Option<String>,
    pub target_kind: Option<TargetKind>,
    pub webhook_id: Option<String>,
    pub webhook_name: Option<String>,
    pub webhook_tag: Option<String>,
    pub event: Option<String>,
    pub condition: Option<String>,
    pub fulfillment: Vec<String>,
    pub partial_response: bool,
    pub parameter_presets: Vec<String>,
}

impl TableRow for TransitionRouteRow {
    const TABLE: TableKind = TableKind::TransitionRoutes;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.flow_id),
            Cell::text(&self.flow_name),
            Cell::maybe(&self.page_id),
            Cell::maybe(&self.page_name),
            Cell::text(&self.transition_route_id),
            Cell::maybe(&self.route_group_id),
            Cell::maybe(&self.route_group_name),
            Cell::maybe(&self.intent_id),
            Cell::maybe(&self.intent_name),
            Cell::maybe(&self.parameter_id),
            Cell::maybe(&self.parameter_name),
            Cell::maybe(&self.target_page_id),
            Cell::maybe(&self.target_page_name),
            Cell::Text(self.target_kind.map(|kind| kind.as_str().to_string())),
            Cell::maybe(&self.webhook_id),
            Cell::maybe(&self.webhook_name),
            Cell::maybe(&self.webhook_tag),
            Cell::maybe(&self.event),
            Cell::maybe(&self.condition),
            Cell::list(&self.fulfillment),
            Cell::Flag(self.partial_response),
            Cell::list(&self.parameter_presets),
        ]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteGroupRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub flow_id: String,
    pub flow_name: String,
    pub route_group_id: String,
    pub route_group_name: String,
    pub routes: Vec<String>,
}

impl TableRow for RouteGroupRow {
    const TABLE: TableKind = TableKind::RouteGroups;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.flow_id),
            Cell::text(&self.flow_name),
            Cell::text(&self.route_group_id),
            Cell::text(&self.route_group_name),
            Cell::list(&self.routes),
        ]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub intent_id: String,
    pub intent_name: String,
    pub description: Option<String>,
    pub parameters: Vec<String>,
    pub labels: Vec<String>,
}

impl TableRow for IntentRow {
    const TABLE: TableKind = TableKind::Intents;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.intent_id),
            Cell::text(&self.intent_name),
            Cell::maybe(&self.description),
            Cell::list(&self.parameters),
            Cell::list(&self.labels),
        ]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPhraseRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub intent_id: String,
    pub intent_name: String,
    pub phrase: String,
    pub annotated_phrase: String,
}

impl TableRow for TrainingPhraseRow {
    const TABLE: TableKind = TableKind::TrainingPhrases;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.intent_id),
            Cell::text(&self.intent_name),
            Cell::text(&self.phrase),
            Cell::text(&self.annotated_phrase),
        ]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub entity_type_id: String,
    pub entity_type_name: String,
    pub entity: String,
    pub synonym: String,
}

impl TableRow for EntityRow {
    const TABLE: TableKind = TableKind::Entities;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.entity_type_id),
            Cell::text(&self.entity_type_name),
            Cell::text(&self.entity),
            Cell::text(&self.synonym),
        ]);
        cells
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRow {
    #[serde(flatten)]
    pub context: SnapshotContext,
    pub webhook_id: String,
    pub webhook_name: String,
    pub timeout: Option<String>,
    pub service_directory: Option<String>,
    pub url: Option<String>,
}

impl TableRow for WebhookRow {
    const TABLE: TableKind = TableKind::Webhooks;

    fn cells(&self) -> Vec<Cell> {
        let mut cells = self.context.stamp_cells().to_vec();
        cells.extend([
            Cell::text(&self.webhook_id),
            Cell::text(&self.webhook_name),
            Cell::maybe(&self.timeout),
            Cell::maybe(&self.service_directory),
            Cell::maybe(&self.url),
        ]);
        cells
    }
}

/// The nine row-sets produced for one agent. Empty sets are empty vectors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowSets {
    pub intents: Vec<IntentRow>,
    pub training_phrases: Vec<TrainingPhraseRow>,
    pub entities: Vec<EntityRow>,
    pub webhooks: Vec<WebhookRow>,
    pub pages: Vec<PageRow>,
    pub flows: Vec<FlowRow>,
    pub transition_routes: Vec<TransitionRouteRow>,
    pub route_groups: Vec<RouteGroupRow>,
    pub parameters: Vec<ParameterRow>,
}

fn cells_of<R: TableRow>(rows: &[R]) -> Vec<Vec<Cell>> {
    rows.iter().map(TableRow::cells).collect()
}

fn json_lines_of<R: TableRow>(rows: &[R]) -> Result<Vec<String>, serde_json::Error> {
    rows.iter().map(serde_json::to_string).collect()
}

impl RowSets {
    pub fn len_of(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Intents => self.intents.len(),
            TableKind::TrainingPhrases => self.training_phrases.len(),
            TableKind::Entities => self.entities.len(),
            TableKind::Webhooks => self.webhooks.len(),
            TableKind::Pages => self.pages.len(),
            TableKind::Flows => self.flows.len(),
            TableKind::TransitionRoutes => self.transition_routes.len(),
            TableKind::RouteGroups => self.route_groups.len(),
            TableKind::Parameters => self.parameters.len(),
        }
    }

    pub fn total_rows(&self) -> usize {
        TableKind::ALL.iter().map(|kind| self.len_of(*kind)).sum()
    }

    /// Cell rows for one table, in schema column order.
    pub fn rows_for(&self, kind: TableKind) -> Vec<Vec<Cell>> {
        match kind {
            TableKind::Intents => cells_of(&self.intents),
            TableKind::TrainingPhrases => cells_of(&self.training_phrases),
            TableKind::Entities => cells_of(&self.entities),
            TableKind::Webhooks => cells_of(&self.webhooks),
            TableKind::Pages => cells_of(&self.pages),
            TableKind::Flows => cells_of(&self.flows),
            TableKind::TransitionRoutes => cells_of(&self.transition_routes),
            TableKind::RouteGroups => cells_of(&self.route_groups),
            TableKind::Parameters => cells_of(&self.parameters),
        }
    }

    /// One compact JSON object per row.
    pub fn json_lines(&self, kind: TableKind) -> Result<Vec<String>, serde_json::Error> {
        match kind {
            TableKind::Intents => json_lines_of(&self.intents),
            TableKind::TrainingPhrases => json_lines_of(&self.training_phrases),
            TableKind::Entities => json_lines_of(&self.entities),
            TableKind::Webhooks => json_lines_of(&self.webhooks),
            TableKind::Pages => json_lines_of(&self.pages),
            TableKind::Flows => json_lines_of(&self.flows),
            TableKind::TransitionRoutes => json_lines_of(&self.transition_routes),
            TableKind::RouteGroups => json_lines_of(&self.route_groups),
            TableKind::Parameters => json_lines_of(&self.parameters),
        }
    }
}
