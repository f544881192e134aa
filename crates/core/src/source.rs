//! Where agent snapshots come from.
//!
//! The agent-management service is reached through [`AgentSource`]. The
//! shipped implementation reads exported snapshot files from a directory tree.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{trailing_segment, AgentSnapshot};
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AgentRef {
    pub project_id: String,
    pub location: String,
    pub agent_id: String,
}

impl AgentRef {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let agent = Self {
            project_id: project_id.into(),
            location: location.into(),
            agent_id: agent_id.into(),
        };
        for (field, value) in [
            ("project_id", &agent.project_id),
            ("location", &agent.location),
            ("agent_id", &agent.agent_id),
        ] {
            if value.trim().is_empty() || value.contains('/') {
                return Err(DomainError::InvalidAgentField { field });
            }
        }
        Ok(agent)
    }

    /// Full resource path, `projects/<p>/locations/<l>/agents/<id>`.
    pub fn path(&self) -> String {
        format!("projects/{}/locations/{}/agents/{}", self.project_id, self.location, self.agent_id)
    }
}

/// Checks a destination project id before it is spliced into a warehouse URL.
pub fn check_destination_project(project_id: &str) -> Result<&str, DomainError> {
    let delimiter = |c: char| matches!(c, '/' | '\\' | '?' | '#' | '%' | '&' | '=' | ':');
    if project_id.trim().is_empty()
        || project_id.contains(delimiter)
        || project_id.chars().any(|c| c.is_whitespace() || c.is_control())
        || project_id.starts_with('.')
    {
        return Err(DomainError::InvalidDestinationProject(project_id.to_string()));
    }
    Ok(project_id)
}

impl fmt::Display for AgentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for AgentRef {
    type Err = DomainError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match segments.as_slice() {
            ["projects", project, "locations", location, "agents", agent] => {
                Self::new(*project, *location, *agent)
                    .map_err(|_| DomainError::MalformedAgentPath(path.to_string()))
            }
            _ => Err(DomainError::MalformedAgentPath(path.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("snapshot file `{0}` does not exist")]
    NotFound(PathBuf),
    #[error("could not read snapshot file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse snapshot file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

/// Supplies the fully materialized configuration of one agent.
pub trait AgentSource {
    fn load(&self, agent: &AgentRef) -> Result<AgentSnapshot, SourceError>;
}

/// Reads `<root>/<project>/<location>/<agent_id>.json`.
#[derive(Clone, Debug)]
pub struct SnapshotDirSource {
    root: PathBuf,
}

impl SnapshotDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn snapshot_path(&self, agent: &AgentRef) -> PathBuf {
        self.root
            .join(&agent.project_id)
            .join(&agent.location)
            .join(format!("{}.json", agent.agent_id))
    }
}

impl AgentSource for SnapshotDirSource {
    fn load(&self, agent: &AgentRef) -> Result<AgentSnapshot, SourceError> {
        let path = self.snapshot_path(agent);
        debug!(
            event_name = "source.snapshot_lookup",
            agent = %agent,
            path = %path.display(),
            "resolving snapshot file"
        );
        let mut snapshot = load_snapshot_file(&path)?;
        if snapshot.agent.name.is_empty() {
            snapshot.agent.name = agent.path();
        }
        if snapshot.agent.display_name.is_empty() {
            snapshot.agent.display_name = agent.agent_id.clone();
        }
        Ok(snapshot)
    }
}

/// Parses one snapshot file. A missing display name falls back to the
/// trailing segment of the agent path.
pub fn load_snapshot_file(path: &Path) -> Result<AgentSnapshot, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)
        .map_err(|source| SourceError::Read { path: path.to_path_buf(), source })?;
    let mut snapshot: AgentSnapshot = serde_json::from_str(&raw)
        .map_err(|source| SourceError::Parse { path: path.to_path_buf(), source })?;

    if snapshot.agent.display_name.is_empty() && !snapshot.agent.name.is_empty() {
        snapshot.agent.display_name = trailing_segment(&snapshot.agent.name).to_string();
    }
    info!(
        event_name = "source.snapshot_loaded",
        path = %path.display(),
        agent = %snapshot.agent.name,
        flows = snapshot.flows.len(),
        intents = snapshot.intents.len(),
        "agent snapshot loaded"
    );
    Ok(snapshot)
}
