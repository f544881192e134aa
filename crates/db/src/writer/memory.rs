use tokio::sync::RwLock;

use flowsnap_core::flatten::SnapshotContext;
use flowsnap_core::rows::RowSets;

use super::{AppendReceipt, Destination, RowSetWriter, WriterError};

#[derive(Clone, Debug, PartialEq)]
pub struct AppendedBatch {
    pub destination: Destination,
    pub context: SnapshotContext,
    pub rows: RowSets,
}

/// Writer double that keeps every appended batch in memory, in call order.
#[derive(Default)]
pub struct InMemoryRowSetWriter {
    batches: RwLock<Vec<AppendedBatch>>,
}

impl InMemoryRowSetWriter {
    pub async fn batches(&self) -> Vec<AppendedBatch> {
        self.batches.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RowSetWriter for InMemoryRowSetWriter {
    async fn append(
        &self,
        destination: &Destination,
        context: &SnapshotContext,
        rows: &RowSets,
    ) -> Result<AppendReceipt, WriterError> {
        let mut batches = self.batches.write().await;
        batches.push(AppendedBatch {
            destination: destination.clone(),
            context: context.clone(),
            rows: rows.clone(),
        });
        Ok(AppendReceipt { run_id: format!("memory-{}", batches.len()), rows_written: rows.total_rows() })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use flowsnap_core::flatten::SnapshotContext;
    use flowsnap_core::rows::{FlowRow, RowSets};

    use crate::writer::{Destination, InMemoryRowSetWriter, RowSetWriter};

    #[tokio::test]
    async fn in_memory_writer_keeps_batches_in_order() {
        let writer = InMemoryRowSetWriter::default();
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("timestamp");
        let context = SnapshotContext::new(at, "projects/p/locations/global/agents/a", "A");
        let rows = RowSets {
            flows: vec![FlowRow {
                context: context.clone(),
                flow_id: "projects/p/locations/global/agents/a/flows/f".to_string(),
                flow_name: "Default Start Flow".to_string(),
                pages: vec![],
            }],
            ..RowSets::default()
        };

        let first = writer
            .append(&Destination::new("dw-1", "agent_structure"), &context, &rows)
            .await
            .expect("append first");
        let second = writer
            .append(&Destination::new("dw-2", "agent_structure"), &context, &RowSets::default())
            .await
            .expect("append second");

        assert_eq!(first.rows_written, 1);
        assert_eq!(second.rows_written, 0);
        let batches = writer.batches().await;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].destination.project_id, "dw-1");
        assert_eq!(batches[0].rows, rows);
    }
}
