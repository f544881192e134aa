//! Agent configuration as delivered by the agent-management service.
//!
//! Shapes follow the service's REST representation: camelCase keys and full
//! resource paths as identifiers. Every collection defaults to empty and every
//! optional string treats `""` as absent.

pub mod agent;
pub mod entity;
pub mod flow;
pub mod fulfillment;
pub mod intent;
pub mod value;
pub mod webhook;

use serde::{Deserialize, Deserializer};

pub use agent::{AgentInfo, AgentSnapshot};
pub use entity::{Entity, EntityType};
pub use flow::{
    FillBehavior, Flow, Form, FormParameter, Page, RouteGroup, RouteTarget, TransitionRoute,
};
pub use fulfillment::{
    Case, CaseContent, ConditionalCases, Fulfillment, ResponseMessage, SetParameterAction,
};
pub use intent::{Intent, IntentParameter, PhrasePart, TrainingPhrase};
pub use value::{DisplayPolicy, PlainJson, Scalar, StructValue, StructVisitor, ValuePolicy};
pub use webhook::{GenericWebService, ServiceDirectory, Webhook};

pub(crate) fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|value| !value.trim().is_empty()))
}

/// Readable label for a resource path: everything after the last `/`.
pub fn trailing_segment(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}
