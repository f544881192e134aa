pub mod config;
pub mod domain;
pub mod errors;
pub mod flatten;
pub mod resolver;
pub mod rows;
pub mod schema;
pub mod source;

pub use config::{AppConfig, ConfigError, LoadOptions};
pub use domain::AgentSnapshot;
pub use errors::{ApplicationError, DomainError, FlattenError};
pub use flatten::{flatten_agent, flatten_agent_with, Flattener, SnapshotContext};
pub use resolver::ReferenceResolver;
pub use rows::{Cell, RowSets, TableRow, TargetKind};
pub use schema::{Column, ColumnType, TableKind, DEFAULT_NAMESPACE};
pub use source::{load_snapshot_file, AgentRef, AgentSource, SnapshotDirSource, SourceError};
