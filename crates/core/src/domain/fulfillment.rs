use std::collections::BTreeMap;

use serde::Deserialize;

use crate::domain::{non_empty, StructValue};

/// Response content plus side effects attached to a page entry, form prompt or route.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fulfillment {
    pub messages: Vec<ResponseMessage>,
    #[serde(deserialize_with = "non_empty")]
    pub webhook: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub tag: Option<String>,
    pub return_partial_responses: bool,
    pub set_parameter_actions: Vec<SetParameterAction>,
    pub conditional_cases: Vec<ConditionalCases>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SetParameterAction {
    pub parameter: String,
    pub value: StructValue,
}

/// One response message. Upstream this is a one-of object; exactly one kind is set.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawResponseMessage")]
pub enum ResponseMessage {
    Text(Vec<String>),
    Payload(BTreeMap<String, StructValue>),
    LiveAgentHandoff(BTreeMap<String, StructValue>),
    ConversationSuccess(BTreeMap<String, StructValue>),
    OutputAudioText(String),
    PlayAudio { audio_uri: Option<String> },
    TelephonyTransferCall { phone_number: Option<String> },
    Unsupported,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConditionalCases {
    pub cases: Vec<Case>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Case {
    #[serde(deserialize_with = "non_empty")]
    pub condition: Option<String>,
    pub case_content: Vec<CaseContent>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(from = "RawCaseContent")]
pub enum CaseContent {
    Message(ResponseMessage),
    AdditionalCases(ConditionalCases),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawResponseMessage {
    text: Option<RawText>,
    payload: Option<BTreeMap<String, StructValue>>,
    live_agent_handoff: Option<RawMetadata>,
    conversation_success: Option<RawMetadata>,
    output_audio_text: Option<RawOutputAudioText>,
    play_audio: Option<RawPlayAudio>,
    telephony_transfer_call: Option<RawTelephonyTransferCall>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawText {
    text: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    metadata: BTreeMap<String, StructValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOutputAudioText {
    ssml: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPlayAudio {
    audio_uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTelephonyTransferCall {
    phone_number: Option<String>,
}

impl From<RawResponseMessage> for ResponseMessage {
    fn from(raw: RawResponseMessage) -> Self {
        if let Some(text) = raw.text {
            return Self::Text(text.text);
        }
        if let Some(payload) = raw.payload {
            return Self::Payload(payload);
        }
        if let Some(handoff) = raw.live_agent_handoff {
            return Self::LiveAgentHandoff(handoff.metadata);
        }
        if let Some(success) = raw.conversation_success {
            return Self::ConversationSuccess(success.metadata);
        }
        if let Some(audio_text) = raw.output_audio_text {
            return Self::OutputAudioText(
                audio_text.ssml.or(audio_text.text).unwrap_or_default(),
            );
        }
        if let Some(play_audio) = raw.play_audio {
            return Self::PlayAudio { audio_uri: play_audio.audio_uri };
        }
        if let Some(transfer) = raw.telephony_transfer_call {
            return Self::TelephonyTransferCall { phone_number: transfer.phone_number };
        }
        Self::Unsupported
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCaseContent {
    message: Option<ResponseMessage>,
    additional_cases: Option<ConditionalCases>,
}

impl From<RawCaseContent> for CaseContent {
    fn from(raw: RawCaseContent) -> Self {
        match (raw.additional_cases, raw.message) {
            (Some(cases), _) => Self::AdditionalCases(cases),
            (None, Some(message)) => Self::Message(message),
            (None, None) => Self::Message(ResponseMessage::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CaseContent, Fulfillment, ResponseMessage};

    #[test]
    fn one_of_messages_map_to_their_variant() {
        let fulfillment: Fulfillment = serde_json::from_value(json!({
            "messages": [
                {"text": {"text": ["Hello", "Hi there"]}},
                {"payload": {"kind": "card"}},
                {"liveAgentHandoff": {"metadata": {"queue": "billing"}}},
                {"conversationSuccess": {"metadata": {}}},
                {"outputAudioText": {"ssml": "<speak>Hi</speak>"}},
                {"playAudio": {"audioUri": "gs://bucket/hello.wav"}},
                {"telephonyTransferCall": {"phoneNumber": "+15550100"}},
                {"knowledgeInfoCard": {}}
            ],
            "webhook": "",
            "returnPartialResponses": true
        }))
        .expect("fulfillment");

        assert_eq!(fulfillment.webhook, None);
        assert!(fulfillment.return_partial_responses);
        assert!(matches!(
            fulfillment.messages.as_slice(),
            [
                ResponseMessage::Text(_),
                ResponseMessage::Payload(_),
                ResponseMessage::LiveAgentHandoff(_),
                ResponseMessage::ConversationSuccess(_),
                ResponseMessage::OutputAudioText(_),
                ResponseMessage::PlayAudio { .. },
                ResponseMessage::TelephonyTransferCall { .. },
                ResponseMessage::Unsupported,
            ]
        ));
    }

    #[test]
    fn case_content_prefers_nested_cases() {
        let fulfillment: Fulfillment = serde_json::from_value(json!({
            "conditionalCases": [{
                "cases": [{
                    "condition": "$session.params.vip = true",
                    "caseContent": [
                        {"message": {"text": {"text": ["Welcome back"]}}},
                        {"additionalCases": {"cases": [{"caseContent": []}]}}
                    ]
                }]
            }]
        }))
        .expect("fulfillment");

        let content = &fulfillment.conditional_cases[0].cases[0].case_content;
        assert!(matches!(content[0], CaseContent::Message(ResponseMessage::Text(_))));
        assert!(matches!(content[1], CaseContent::AdditionalCases(_)));
    }
}
