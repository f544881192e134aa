//! Append-only persistence of flattened row-sets.

use async_trait::async_trait;
use thiserror::Error;

use flowsnap_core::errors::ApplicationError;
use flowsnap_core::flatten::SnapshotContext;
use flowsnap_core::rows::RowSets;
use flowsnap_core::schema::TableKind;

pub mod memory;
pub mod sql;

pub use memory::{AppendedBatch, InMemoryRowSetWriter};
pub use sql::SqlRowSetWriter;

/// Where one agent's row-sets land: the destination project and the table namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub project_id: String,
    pub namespace: String,
}

impl Destination {
    pub fn new(project_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { project_id: project_id.into(), namespace: namespace.into() }
    }

    pub fn table_path(&self, kind: TableKind) -> String {
        kind.table_path(&self.namespace)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendReceipt {
    pub run_id: String,
    pub rows_written: usize,
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("table `{table}` exists with columns [{found}], expected [{expected}]")]
    SchemaMismatch { table: String, expected: String, found: String },
    #[error("row for `{table}` has {found} cells, expected {expected}")]
    CellCount { table: String, expected: usize, found: usize },
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<WriterError> for ApplicationError {
    fn from(value: WriterError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

#[async_trait]
pub trait RowSetWriter: Send + Sync {
    /// Appends every row of `rows` under `destination`. Existing rows are never touched.
    async fn append(
        &self,
        destination: &Destination,
        context: &SnapshotContext,
        rows: &RowSets,
    ) -> Result<AppendReceipt, WriterError>;
}
