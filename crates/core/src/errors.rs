use thiserror::Error;

use crate::config::ConfigError;
use crate::flatten::MessageKind;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("could not encode {kind:?} message descriptor: {source}")]
    Descriptor { kind: MessageKind, source: serde_json::Error },
    #[error("could not encode parameter preset: {0}")]
    ParameterPreset(serde_json::Error),
    #[error("could not encode parameters of intent `{intent_id}`: {source}")]
    IntentParameter { intent_id: String, source: serde_json::Error },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("agent reference field `{field}` must be a single non-empty path segment")]
    InvalidAgentField { field: &'static str },
    #[error("`{0}` is not of the form projects/<project>/locations/<location>/agents/<id>")]
    MalformedAgentPath(String),
    #[error("destination project `{0}` must be a single non-empty name without URL delimiters")]
    InvalidDestinationProject(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("snapshot source failure: {0}")]
    Source(String),
    #[error("flatten failure: {0}")]
    Flatten(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable class string reported in command outcomes.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "invalid_input",
            Self::Source(_) => "source",
            Self::Flatten(_) => "flatten",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "config",
        }
    }
}

impl From<FlattenError> for ApplicationError {
    fn from(value: FlattenError) -> Self {
        Self::Flatten(value.to_string())
    }
}

impl From<SourceError> for ApplicationError {
    fn from(value: SourceError) -> Self {
        Self::Source(value.to_string())
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}
