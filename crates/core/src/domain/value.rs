use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Leaf of a structured value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Kept as parsed, so integers stay integers and large ids stay exact.
    Number(serde_json::Number),
    String(String),
}

/// Dynamic structured data (custom payloads, handoff metadata, preset values).
///
/// The shape set is closed: a scalar, an ordered sequence, or a mapping whose
/// key order carries no meaning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructValue {
    Scalar(Scalar),
    List(Vec<StructValue>),
    Map(BTreeMap<String, StructValue>),
}

impl Default for StructValue {
    fn default() -> Self {
        Self::Scalar(Scalar::Null)
    }
}

/// Bottom-up fold over a [`StructValue`]: children are visited before their parent.
pub trait StructVisitor {
    type Output;

    fn visit_scalar(&mut self, scalar: &Scalar) -> Self::Output;
    fn visit_list(&mut self, items: Vec<Self::Output>) -> Self::Output;
    fn visit_map(&mut self, entries: BTreeMap<String, Self::Output>) -> Self::Output;
}

impl StructValue {
    pub fn accept<V>(&self, visitor: &mut V) -> V::Output
    where
        V: StructVisitor,
    {
        match self {
            Self::Scalar(scalar) => visitor.visit_scalar(scalar),
            Self::List(items) => {
                let items = items.iter().map(|item| item.accept(visitor)).collect();
                visitor.visit_list(items)
            }
            Self::Map(entries) => {
                let entries = entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.accept(visitor)))
                    .collect();
                visitor.visit_map(entries)
            }
        }
    }

    pub fn to_plain_json(&self) -> serde_json::Value {
        self.accept(&mut PlainJson)
    }
}

/// Lowers a [`StructValue`] into plain nested JSON maps and lists; scalars pass through.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainJson;

impl StructVisitor for PlainJson {
    type Output = serde_json::Value;

    fn visit_scalar(&mut self, scalar: &Scalar) -> Self::Output {
        match scalar {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(value) => serde_json::Value::Bool(*value),
            Scalar::Number(value) => serde_json::Value::Number(value.clone()),
            Scalar::String(value) => serde_json::Value::String(value.clone()),
        }
    }

    fn visit_list(&mut self, items: Vec<Self::Output>) -> Self::Output {
        serde_json::Value::Array(items)
    }

    fn visit_map(&mut self, entries: BTreeMap<String, Self::Output>) -> Self::Output {
        serde_json::Value::Object(entries.into_iter().collect())
    }
}

/// Renders a preset value into the single string stored in a row.
pub trait ValuePolicy {
    fn render(&self, value: &StructValue) -> String;
}

/// Direct string conversion: strings verbatim, other scalars via `Display`,
/// composites as compact JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisplayPolicy;

impl ValuePolicy for DisplayPolicy {
    fn render(&self, value: &StructValue) -> String {
        match value {
            StructValue::Scalar(Scalar::Null) => "null".to_string(),
            StructValue::Scalar(Scalar::Bool(value)) => value.to_string(),
            StructValue::Scalar(Scalar::Number(value)) => value.to_string(),
            StructValue::Scalar(Scalar::String(value)) => value.clone(),
            composite => composite.to_plain_json().to_string(),
        }
    }
}
