//! Intent rows and training-phrase reconstruction.
//!
//! Upstream phrases are exploded into one part per text run, as the bulk
//! export presents them; [`group_training_phrases`] stitches consecutive parts
//! with the same (intent, phrase index) back into a plain phrase and an
//! annotated one.

use serde::Serialize;

use crate::domain::{Intent, ValuePolicy};
use crate::errors::FlattenError;
use crate::flatten::Flattener;
use crate::resolver::ReferenceResolver;
use crate::rows::{IntentRow, TrainingPhraseRow};

const UNKNOWN_ENTITY_LABEL: &str = "unknown";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingPhrasePart {
    pub intent_id: String,
    pub intent_name: String,
    pub phrase_index: usize,
    pub text: String,
    pub parameter_id: Option<String>,
    pub entity_type: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupedPhrase {
    pub intent_id: String,
    pub intent_name: String,
    pub phrase: String,
    pub annotated_phrase: String,
}

#[derive(Serialize)]
struct IntentParameterDescriptor<'a> {
    id: &'a str,
    entity_type: &'a str,
    is_list: bool,
}

/// One part per text run, phrases numbered per intent in declaration order.
pub fn explode_training_phrases(intents: &[Intent]) -> Vec<TrainingPhrasePart> {
    intents
        .iter()
        .flat_map(|intent| {
            intent.training_phrases.iter().enumerate().flat_map(move |(phrase_index, phrase)| {
                phrase.parts.iter().map(move |part| TrainingPhrasePart {
                    intent_id: intent.name.clone(),
                    intent_name: intent.display_name.clone(),
                    phrase_index,
                    text: part.text.clone(),
                    parameter_id: part.parameter_id.clone(),
                    entity_type: part
                        .parameter_id
                        .as_deref()
                        .and_then(|id| intent.parameter_entity_type(id))
                        .map(str::to_string),
                })
            })
        })
        .collect()
}

/// Rebuilds phrases from consecutive parts. Parts join with a single space
/// and the result is trimmed; annotated runs render as
/// `[text]{@entity_type parameter_id}`.
pub fn group_training_phrases(
    parts: &[TrainingPhrasePart],
    resolver: &ReferenceResolver,
) -> Vec<GroupedPhrase> {
    let mut phrases = Vec::new();
    let mut current: Option<PhraseInProgress<'_>> = None;

    for part in parts {
        let same_phrase = current.as_ref().is_some_and(|(first, _, _)| {
            first.intent_id == part.intent_id && first.phrase_index == part.phrase_index
        });
        if !same_phrase {
            if let Some(finished) = current.take() {
                phrases.push(finish_phrase(finished));
            }
            current = Some((part, Vec::new(), Vec::new()));
        }

        if let Some((_, plain, annotated)) = current.as_mut() {
            plain.push(part.text.clone());
            annotated.push(annotate(part, resolver));
        }
    }
    if let Some(finished) = current {
        phrases.push(finish_phrase(finished));
    }
    phrases
}

fn annotate(part: &TrainingPhrasePart, resolver: &ReferenceResolver) -> String {
    match part.parameter_id.as_deref() {
        Some(parameter_id) => {
            let entity = part
                .entity_type
                .as_deref()
                .map(|id| resolver.entity_type_label(id))
                .unwrap_or_else(|| UNKNOWN_ENTITY_LABEL.to_string());
            format!("[{}]{{@{entity} {parameter_id}}}", part.text)
        }
        None => part.text.clone(),
    }
}

type PhraseInProgress<'a> = (&'a TrainingPhrasePart, Vec<String>, Vec<String>);

fn finish_phrase((first, plain, annotated): PhraseInProgress<'_>) -> GroupedPhrase {
    GroupedPhrase {
        intent_id: first.intent_id.clone(),
        intent_name: first.intent_name.clone(),
        phrase: plain.join(" ").trim().to_string(),
        annotated_phrase: annotated.join(" ").trim().to_string(),
    }
}

impl<P: ValuePolicy> Flattener<'_, P> {
    pub fn intent_rows(&self, intents: &[Intent]) -> Result<Vec<IntentRow>, FlattenError> {
        let mut rows = Vec::with_capacity(intents.len());
        for intent in intents {
            let parameters = intent
                .parameters
                .iter()
                .map(|parameter| {
                    serde_json::to_string(&IntentParameterDescriptor {
                        id: &parameter.id,
                        entity_type: &parameter.entity_type,
                        is_list: parameter.is_list,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| FlattenError::IntentParameter {
                    intent_id: intent.name.clone(),
                    source,
                })?;

            rows.push(IntentRow {
                context: self.context.clone(),
                intent_id: intent.name.clone(),
                intent_name: intent.display_name.clone(),
                description: Some(intent.description.clone()).filter(|text| !text.is_empty()),
                parameters,
                labels: intent.labels.keys().cloned().collect(),
            });
        }
        Ok(rows)
    }

    pub fn training_phrase_rows(&self, intents: &[Intent]) -> Vec<TrainingPhraseRow> {
        let parts = explode_training_phrases(intents);
        group_training_phrases(&parts, self.resolver)
            .into_iter()
            .map(|phrase| TrainingPhraseRow {
                context: self.context.clone(),
                intent_id: phrase.intent_id,
                intent_name: phrase.intent_name,
                phrase: phrase.phrase,
                annotated_phrase: phrase.annotated_phrase,
            })
            .collect()
    }
}
