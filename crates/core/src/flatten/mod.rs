//! Structure flattener: agent snapshot in, nine row-sets out.
//!
//! The walk is synchronous and reads only the snapshot and the resolver maps.
//! Every row carries the same [`SnapshotContext`], supplied by the caller.

pub mod catalog;
pub mod conditional;
pub mod fulfillment;
pub mod intents;
pub mod parameters;
pub mod routes;
pub mod structure;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{AgentSnapshot, DisplayPolicy, ValuePolicy};
use crate::errors::FlattenError;
use crate::resolver::ReferenceResolver;
use crate::rows::RowSets;
use crate::schema::TableKind;

pub use conditional::render_conditional_cases;
pub use fulfillment::{
    FlattenedFulfillment, FulfillmentFlattener, MessageDescriptor, MessageKind, WebhookRef,
};
pub use intents::{explode_training_phrases, group_training_phrases, GroupedPhrase, TrainingPhrasePart};
pub use parameters::ParameterFlattening;
pub use routes::{ParameterScope, RouteScope};

/// Snapshot stamp shared by every row of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotContext {
    #[serde(rename = "date")]
    pub snapshot_at: DateTime<Utc>,
    pub agent_id: String,
    pub agent_name: String,
}

impl SnapshotContext {
    pub fn new(
        snapshot_at: DateTime<Utc>,
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Self {
        Self { snapshot_at, agent_id: agent_id.into(), agent_name: agent_name.into() }
    }
}

pub struct Flattener<'a, P = DisplayPolicy> {
    context: &'a SnapshotContext,
    resolver: &'a ReferenceResolver,
    fulfillments: FulfillmentFlattener<'a, P>,
}

impl<'a, P: ValuePolicy> Flattener<'a, P> {
    pub fn new(context: &'a SnapshotContext, resolver: &'a ReferenceResolver, policy: P) -> Self {
        Self { context, resolver, fulfillments: FulfillmentFlattener::new(resolver, policy) }
    }

    pub fn context(&self) -> &SnapshotContext {
        self.context
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        self.resolver
    }

    pub fn run(&self, snapshot: &AgentSnapshot) -> Result<RowSets, FlattenError> {
        let mut rows = RowSets {
            intents: self.intent_rows(&snapshot.intents)?,
            training_phrases: self.training_phrase_rows(&snapshot.intents),
            entities: self.entity_rows(&snapshot.entity_types),
            webhooks: self.webhook_rows(&snapshot.webhooks),
            ..RowSets::default()
        };

        for flow in &snapshot.flows {
            self.flatten_flow(snapshot, flow, &mut rows)?;
        }

        info!(
            event_name = "flatten.completed",
            agent_id = %self.context.agent_id,
            intents = rows.len_of(TableKind::Intents),
            training_phrases = rows.len_of(TableKind::TrainingPhrases),
            entities = rows.len_of(TableKind::Entities),
            webhooks = rows.len_of(TableKind::Webhooks),
            pages = rows.len_of(TableKind::Pages),
            flows = rows.len_of(TableKind::Flows),
            transition_routes = rows.len_of(TableKind::TransitionRoutes),
            route_groups = rows.len_of(TableKind::RouteGroups),
            parameters = rows.len_of(TableKind::Parameters),
            "agent snapshot flattened"
        );
        Ok(rows)
    }
}

/// Flattens one agent with resolver maps built from the snapshot itself and
/// plain string conversion for preset values.
pub fn flatten_agent(
    snapshot: &AgentSnapshot,
    context: &SnapshotContext,
) -> Result<RowSets, FlattenError> {
    let resolver = ReferenceResolver::from_snapshot(snapshot);
    flatten_agent_with(snapshot, context, &resolver, DisplayPolicy)
}

pub fn flatten_agent_with<P: ValuePolicy>(
    snapshot: &AgentSnapshot,
    context: &SnapshotContext,
    resolver: &ReferenceResolver,
    policy: P,
) -> Result<RowSets, FlattenError> {
    Flattener::new(context, resolver, policy).run(snapshot)
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{TimeZone, Utc};

    use super::SnapshotContext;

    pub const AGENT: &str = "projects/p/locations/global/agents/a";
    pub const FLOW: &str = "projects/p/locations/global/agents/a/flows/main";

    pub fn context() -> SnapshotContext {
        SnapshotContext::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("timestamp"),
            AGENT,
            "Support Agent",
        )
    }
}
