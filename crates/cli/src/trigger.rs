//! Batch trigger message: which agents to snapshot and where to append them.
//!
//! A message is either the push envelope `{"data": "<base64 JSON>"}` or the
//! decoded JSON list itself.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use flowsnap_core::errors::DomainError;
use flowsnap_core::source::{check_destination_project, AgentRef};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub agent_project_id: String,
    pub agent_location: String,
    pub agent_id: String,
    pub bq_project_id: String,
}

impl BatchEntry {
    pub fn agent_ref(&self) -> Result<AgentRef, DomainError> {
        AgentRef::new(&self.agent_project_id, &self.agent_location, &self.agent_id)
    }

    pub fn destination_project(&self) -> Result<&str, DomainError> {
        check_destination_project(&self.bq_project_id)
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("trigger message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trigger envelope `data` is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("trigger envelope `data` is not UTF-8")]
    Utf8,
    #[error("trigger message must be a `data` envelope or a list of agents")]
    Shape,
}

pub fn decode_message(raw: &str) -> Result<Vec<BatchEntry>, TriggerError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    match value {
        Value::Array(_) => Ok(serde_json::from_value(value)?),
        Value::Object(ref envelope) => {
            let Some(Value::String(data)) = envelope.get("data") else {
                return Err(TriggerError::Shape);
            };
            let bytes = base64::engine::general_purpose::STANDARD.decode(data.trim())?;
            let decoded = String::from_utf8(bytes).map_err(|_| TriggerError::Utf8)?;
            Ok(serde_json::from_str(&decoded)?)
        }
        _ => Err(TriggerError::Shape),
    }
}

/// Inverse of [`decode_message`] for the envelope form.
pub fn encode_envelope(entries: &[BatchEntry]) -> Result<String, TriggerError> {
    let payload = serde_json::to_string(entries)?;
    let data = base64::engine::general_purpose::STANDARD.encode(payload);
    Ok(serde_json::json!({ "data": data }).to_string())
}
