use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::domain::{Fulfillment, ResponseMessage, StructValue, ValuePolicy};
use crate::errors::FlattenError;
use crate::flatten::conditional::render_conditional_cases;
use crate::resolver::ReferenceResolver;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    #[serde(rename = "Agent says")]
    AgentSays,
    #[serde(rename = "Custom payload")]
    CustomPayload,
    #[serde(rename = "Live agent handoff")]
    LiveAgentHandoff,
    #[serde(rename = "Conversation success metadata")]
    ConversationSuccess,
    #[serde(rename = "Output audio text")]
    OutputAudioText,
    #[serde(rename = "Conditional response")]
    ConditionalResponse,
}

/// `{type, data}` pair stored as one string per message.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessageDescriptor {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub data: serde_json::Value,
}

impl MessageDescriptor {
    pub fn encode(&self) -> Result<String, FlattenError> {
        serde_json::to_string(self)
            .map_err(|source| FlattenError::Descriptor { kind: self.kind, source })
    }
}

#[derive(Serialize)]
struct ParameterPreset<'a> {
    parameter: &'a str,
    value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookRef {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlattenedFulfillment {
    pub messages: Vec<String>,
    pub webhook: Option<WebhookRef>,
    pub webhook_tag: Option<String>,
    pub partial_response: bool,
    /// One `{"parameter","value"}` object per action; a parameter may repeat.
    pub parameter_presets: Vec<String>,
}

impl FlattenedFulfillment {
    pub fn webhook_id(&self) -> Option<String> {
        self.webhook.as_ref().map(|webhook| webhook.id.clone())
    }

    pub fn webhook_name(&self) -> Option<String> {
        self.webhook.as_ref().map(|webhook| webhook.name.clone())
    }
}

pub struct FulfillmentFlattener<'a, P> {
    resolver: &'a ReferenceResolver,
    policy: P,
}

impl<'a, P: ValuePolicy> FulfillmentFlattener<'a, P> {
    pub fn new(resolver: &'a ReferenceResolver, policy: P) -> Self {
        Self { resolver, policy }
    }

    /// An absent fulfillment flattens to the empty result.
    pub fn flatten(
        &self,
        fulfillment: Option<&Fulfillment>,
    ) -> Result<FlattenedFulfillment, FlattenError> {
        let Some(fulfillment) = fulfillment else {
            return Ok(FlattenedFulfillment::default());
        };

        let mut messages = Vec::with_capacity(fulfillment.messages.len());
        for message in &fulfillment.messages {
            if let Some(descriptor) = describe_message(message) {
                messages.push(descriptor.encode()?);
            }
        }
        for conditional in &fulfillment.conditional_cases {
            let descriptor = MessageDescriptor {
                kind: MessageKind::ConditionalResponse,
                data: serde_json::Value::String(render_conditional_cases(conditional, 0)),
            };
            messages.push(descriptor.encode()?);
        }

        let mut parameter_presets = Vec::with_capacity(fulfillment.set_parameter_actions.len());
        for action in &fulfillment.set_parameter_actions {
            let preset = ParameterPreset {
                parameter: &action.parameter,
                value: self.policy.render(&action.value),
            };
            parameter_presets.push(
                serde_json::to_string(&preset).map_err(FlattenError::ParameterPreset)?,
            );
        }

        let webhook = fulfillment.webhook.as_ref().map(|id| WebhookRef {
            id: id.clone(),
            name: self.resolver.webhook_label(id),
        });

        Ok(FlattenedFulfillment {
            messages,
            webhook,
            webhook_tag: fulfillment.tag.clone(),
            partial_response: fulfillment.return_partial_responses,
            parameter_presets,
        })
    }
}

fn describe_message(message: &ResponseMessage) -> Option<MessageDescriptor> {
    let (kind, data) = match message {
        ResponseMessage::Text(variants) => (MessageKind::AgentSays, serde_json::json!(variants)),
        ResponseMessage::Payload(payload) => (MessageKind::CustomPayload, plain_map(payload)),
        ResponseMessage::LiveAgentHandoff(metadata) => {
            (MessageKind::LiveAgentHandoff, plain_map(metadata))
        }
        ResponseMessage::ConversationSuccess(metadata) => {
            (MessageKind::ConversationSuccess, plain_map(metadata))
        }
        ResponseMessage::OutputAudioText(ssml) => {
            (MessageKind::OutputAudioText, serde_json::Value::String(ssml.clone()))
        }
        ResponseMessage::PlayAudio { .. }
        | ResponseMessage::TelephonyTransferCall { .. }
        | ResponseMessage::Unsupported => {
            trace!(event_name = "fulfillment.message_skipped", ?message, "message kind not exported");
            return None;
        }
    };
    Some(MessageDescriptor { kind, data })
}

fn plain_map(entries: &BTreeMap<String, StructValue>) -> serde_json::Value {
    serde_json::Value::Object(
        entries.iter().map(|(key, value)| (key.clone(), value.to_plain_json())).collect(),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{FulfillmentFlattener, MessageDescriptor, MessageKind};
    use crate::domain::{DisplayPolicy, Fulfillment, StructValue, ValuePolicy};
    use crate::resolver::ReferenceResolver;

    fn fulfillment(value: serde_json::Value) -> Fulfillment {
        serde_json::from_value(value).expect("fulfillment")
    }

    fn resolver() -> ReferenceResolver {
        let mut resolver = ReferenceResolver::default();
        resolver.insert_webhook("agents/a/webhooks/w1", "orders");
        resolver
    }

    fn decode(message: &str) -> serde_json::Value {
        serde_json::from_str(message).expect("descriptor json")
    }

    #[test]
    fn unsupported_audio_is_skipped() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({
                "messages": [
                    {"playAudio": {"audioUri": "gs://bucket/hello.wav"}},
                    {"text": {"text": ["Hello"]}}
                ]
            }))))
            .expect("flatten");

        assert_eq!(flattened.messages.len(), 1);
        assert_eq!(decode(&flattened.messages[0]), json!({"type": "Agent says", "data": ["Hello"]}));
    }

    #[test]
    fn every_supported_kind_is_tagged() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({
                "messages": [
                    {"payload": {"richContent": [[{"type": "chips", "options": [{"text": "Yes"}]}]]}},
                    {"liveAgentHandoff": {"metadata": {"queue": "billing"}}},
                    {"conversationSuccess": {"metadata": {"resolved": true}}},
                    {"outputAudioText": {"ssml": "<speak>Hi</speak>"}},
                    {"telephonyTransferCall": {"phoneNumber": "+15550100"}}
                ],
                "conditionalCases": [{"cases": [
                    {"condition": "A", "caseContent": [{"message": {"text": {"text": ["Hi"]}}}]},
                    {"caseContent": [{"message": {"text": {"text": ["Bye"]}}}]}
                ]}]
            }))))
            .expect("flatten");

        let decoded: Vec<serde_json::Value> = flattened.messages.iter().map(|m| decode(m)).collect();
        assert_eq!(
            decoded,
            vec![
                json!({"type": "Custom payload", "data": {"richContent": [[{"type": "chips", "options": [{"text": "Yes"}]}]]}}),
                json!({"type": "Live agent handoff", "data": {"queue": "billing"}}),
                json!({"type": "Conversation success metadata", "data": {"resolved": true}}),
                json!({"type": "Output audio text", "data": "<speak>Hi</speak>"}),
                json!({"type": "Conditional response", "data": "if A\n  Hi\nelse\n  Bye\n"}),
            ]
        );
    }

    #[test]
    fn webhook_and_flags_are_carried() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({
                "webhook": "agents/a/webhooks/w1",
                "tag": "lookup-order",
                "returnPartialResponses": true
            }))))
            .expect("flatten");

        assert_eq!(flattened.webhook_id().as_deref(), Some("agents/a/webhooks/w1"));
        assert_eq!(flattened.webhook_name().as_deref(), Some("orders"));
        assert_eq!(flattened.webhook_tag.as_deref(), Some("lookup-order"));
        assert!(flattened.partial_response);
        assert!(flattened.messages.is_empty());
    }

    #[test]
    fn unknown_webhook_uses_trailing_segment() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({"webhook": "agents/a/webhooks/legacy"}))))
            .expect("flatten");
        assert_eq!(flattened.webhook_name().as_deref(), Some("legacy"));
    }

    #[test]
    fn repeated_presets_are_all_kept() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({
                "setParameterActions": [
                    {"parameter": "tier", "value": "gold"},
                    {"parameter": "tier", "value": "silver"},
                    {"parameter": "retries", "value": 2}
                ]
            }))))
            .expect("flatten");

        let decoded: Vec<serde_json::Value> =
            flattened.parameter_presets.iter().map(|p| decode(p)).collect();
        assert_eq!(
            decoded,
            vec![
                json!({"parameter": "tier", "value": "gold"}),
                json!({"parameter": "tier", "value": "silver"}),
                json!({"parameter": "retries", "value": "2"}),
            ]
        );
    }

    #[test]
    fn payload_and_preset_numbers_are_not_widened() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({
                "messages": [{"payload": {"quantity": 2, "orderId": 9007199254740993u64}}],
                "setParameterActions": [{"parameter": "ids", "value": [1, 2]}]
            }))))
            .expect("flatten");

        assert_eq!(
            flattened.messages[0],
            r#"{"type":"Custom payload","data":{"orderId":9007199254740993,"quantity":2}}"#
        );
        assert_eq!(flattened.parameter_presets[0], r#"{"parameter":"ids","value":"[1,2]"}"#);
    }

    #[test]
    fn value_policy_is_pluggable() {
        struct Upper;
        impl ValuePolicy for Upper {
            fn render(&self, value: &StructValue) -> String {
                DisplayPolicy.render(value).to_uppercase()
            }
        }

        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, Upper);
        let flattened = flattener
            .flatten(Some(&fulfillment(json!({
                "setParameterActions": [{"parameter": "tier", "value": "gold"}]
            }))))
            .expect("flatten");
        assert_eq!(decode(&flattened.parameter_presets[0])["value"], "GOLD");
    }

    #[test]
    fn descriptor_serializes_type_before_data() {
        let descriptor = MessageDescriptor {
            kind: MessageKind::OutputAudioText,
            data: json!("<speak>Hi</speak>"),
        };
        assert_eq!(
            descriptor.encode().expect("encode"),
            r#"{"type":"Output audio text","data":"<speak>Hi</speak>"}"#
        );
    }

    #[test]
    fn absent_fulfillment_is_empty() {
        let resolver = resolver();
        let flattener = FulfillmentFlattener::new(&resolver, DisplayPolicy);
        let flattened = flattener.flatten(None).expect("flatten");
        assert_eq!(flattened, Default::default());
    }
}
