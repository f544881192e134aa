use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{error, info};

use flowsnap_core::flatten::SnapshotContext;
use flowsnap_core::rows::{Cell, RowSets};
use flowsnap_core::schema::{Column, ColumnType, TableKind};

use super::{AppendReceipt, Destination, RowSetWriter, WriterError};
use crate::DbPool;

pub struct SqlRowSetWriter {
    pool: DbPool,
}

impl SqlRowSetWriter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn append_in_transaction(
        &self,
        destination: &Destination,
        context: &SnapshotContext,
        rows: &RowSets,
    ) -> Result<AppendReceipt, WriterError> {
        let mut tx = self.pool.begin().await?;
        let mut counts = BTreeMap::new();

        for kind in TableKind::ALL {
            let table = destination.table_path(kind);
            ensure_table(&mut tx, &table, kind.columns()).await?;
            let written = insert_rows(&mut tx, &table, kind.columns(), rows.rows_for(kind)).await?;
            counts.insert(kind.table_suffix(), written);
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let total_rows: usize = counts.values().sum();
        sqlx::query(
            "INSERT INTO export_run (id, agent_id, agent_name, destination_project, namespace,
                                     snapshot_at, row_counts_json, total_rows, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&run_id)
        .bind(&context.agent_id)
        .bind(&context.agent_name)
        .bind(&destination.project_id)
        .bind(&destination.namespace)
        .bind(timestamp_text(context))
        .bind(serde_json::to_string(&counts)?)
        .bind(total_rows as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AppendReceipt { run_id, rows_written: total_rows })
    }
}

#[async_trait::async_trait]
impl RowSetWriter for SqlRowSetWriter {
    async fn append(
        &self,
        destination: &Destination,
        context: &SnapshotContext,
        rows: &RowSets,
    ) -> Result<AppendReceipt, WriterError> {
        match self.append_in_transaction(destination, context, rows).await {
            Ok(receipt) => {
                info!(
                    event_name = "writer.append_completed",
                    run_id = %receipt.run_id,
                    agent_id = %context.agent_id,
                    destination_project = %destination.project_id,
                    namespace = %destination.namespace,
                    rows_written = receipt.rows_written,
                    "appended agent row-sets"
                );
                Ok(receipt)
            }
            Err(err) => {
                error!(
                    event_name = "writer.append_failed",
                    agent_id = %context.agent_id,
                    destination_project = %destination.project_id,
                    error = %err,
                    "append rolled back"
                );
                Err(err)
            }
        }
    }
}

fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Boolean => "INTEGER",
        ColumnType::DateTime | ColumnType::String | ColumnType::Repeated => "TEXT",
    }
}

fn describe(columns: impl Iterator<Item = (String, String)>) -> String {
    columns.map(|(name, ty)| format!("{name} {ty}")).collect::<Vec<_>>().join(", ")
}

async fn ensure_table(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    columns: &[Column],
) -> Result<(), WriterError> {
    let definition = columns
        .iter()
        .map(|column| format!("\"{}\" {}", column.name, sql_type(column.column_type)))
        .collect::<Vec<_>>()
        .join(", ");
    sqlx::query(&format!("CREATE TABLE IF NOT EXISTS \"{table}\" ({definition})"))
        .execute(&mut **tx)
        .await?;

    let found: Vec<(String, String)> =
        sqlx::query("SELECT name, type FROM pragma_table_info(?) ORDER BY cid")
            .bind(table)
            .fetch_all(&mut **tx)
            .await?
            .into_iter()
            .map(|row| (row.get::<String, _>("name"), row.get::<String, _>("type")))
            .collect();
    let expected: Vec<(String, String)> = columns
        .iter()
        .map(|column| (column.name.to_string(), sql_type(column.column_type).to_string()))
        .collect();

    if found != expected {
        return Err(WriterError::SchemaMismatch {
            table: table.to_string(),
            expected: describe(expected.into_iter()),
            found: describe(found.into_iter()),
        });
    }
    Ok(())
}

async fn insert_rows(
    tx: &mut Transaction<'_, Sqlite>,
    table: &str,
    columns: &[Column],
    rows: Vec<Vec<Cell>>,
) -> Result<usize, WriterError> {
    if rows.is_empty() {
        return Ok(0);
    }

    let names = columns.iter().map(|column| format!("\"{}\"", column.name)).collect::<Vec<_>>();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let statement =
        format!("INSERT INTO \"{table}\" ({}) VALUES ({placeholders})", names.join(", "));

    let count = rows.len();
    for cells in rows {
        if cells.len() != columns.len() {
            return Err(WriterError::CellCount {
                table: table.to_string(),
                expected: columns.len(),
                found: cells.len(),
            });
        }
        let mut query = sqlx::query(&statement);
        for cell in cells {
            query = match cell {
                Cell::Timestamp(at) => query.bind(at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
                Cell::Text(value) => query.bind(value),
                Cell::Flag(flag) => query.bind(flag),
                Cell::List(values) => query.bind(serde_json::to_string(&values)?),
            };
        }
        query.execute(&mut **tx).await?;
    }
    Ok(count)
}

fn timestamp_text(context: &SnapshotContext) -> String {
    context.snapshot_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use sqlx::Row;

    use flowsnap_core::flatten::SnapshotContext;
    use flowsnap_core::rows::{FlowRow, RowSets};
    use flowsnap_core::schema::TableKind;

    use crate::writer::{Destination, RowSetWriter, SqlRowSetWriter, WriterError};
    use crate::{connect_with_settings, migrations};

    async fn writer() -> SqlRowSetWriter {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlRowSetWriter::new(pool)
    }

    fn context() -> SnapshotContext {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("timestamp");
        SnapshotContext::new(at, "projects/p/locations/global/agents/a", "Agent A")
    }

    fn flow_rows(context: &SnapshotContext) -> RowSets {
        RowSets {
            flows: vec![FlowRow {
                context: context.clone(),
                flow_id: "projects/p/locations/global/agents/a/flows/f".to_string(),
                flow_name: "Default Start Flow".to_string(),
                pages: vec!["projects/p/locations/global/agents/a/flows/f".to_string()],
            }],
            ..RowSets::default()
        }
    }

    #[tokio::test]
    async fn append_creates_every_table_and_records_the_run() {
        let writer = writer().await;
        let context = context();
        let destination = Destination::new("dw", "agent_structure");

        let receipt =
            writer.append(&destination, &context, &flow_rows(&context)).await.expect("append");
        assert_eq!(receipt.rows_written, 1);

        for kind in TableKind::ALL {
            let count: i64 = sqlx::query(
                "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(destination.table_path(kind))
            .fetch_one(writer.pool())
            .await
            .expect("lookup table")
            .get("count");
            assert_eq!(count, 1, "{} should exist", destination.table_path(kind));
        }

        let row = sqlx::query(
            "SELECT \"date\", \"flowName\", \"pages\" FROM \"agent_structure.flows\"",
        )
        .fetch_one(writer.pool())
        .await
        .expect("flow row");
        assert_eq!(row.get::<String, _>("date"), "2026-03-01T12:00:00Z");
        assert_eq!(row.get::<String, _>("flowName"), "Default Start Flow");
        assert_eq!(
            row.get::<String, _>("pages"),
            "[\"projects/p/locations/global/agents/a/flows/f\"]"
        );

        let run = sqlx::query("SELECT id, total_rows, row_counts_json FROM export_run")
            .fetch_one(writer.pool())
            .await
            .expect("run row");
        assert_eq!(run.get::<String, _>("id"), receipt.run_id);
        assert_eq!(run.get::<i64, _>("total_rows"), 1);
        assert!(run.get::<String, _>("row_counts_json").contains("\"flows\":1"));
    }

    #[tokio::test]
    async fn append_is_additive() {
        let writer = writer().await;
        let context = context();
        let destination = Destination::new("dw", "agent_structure");
        let rows = flow_rows(&context);

        writer.append(&destination, &context, &rows).await.expect("first append");
        writer.append(&destination, &context, &rows).await.expect("second append");

        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM \"agent_structure.flows\"")
            .fetch_one(writer.pool())
            .await
            .expect("count rows")
            .get("count");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn mismatched_existing_table_rolls_back_the_append() {
        let writer = writer().await;
        let context = context();
        let destination = Destination::new("dw", "agent_structure");
        sqlx::query("CREATE TABLE \"agent_structure.flows\" (\"id\" TEXT)")
            .execute(writer.pool())
            .await
            .expect("create conflicting table");

        let err = writer
            .append(&destination, &context, &flow_rows(&context))
            .await
            .expect_err("schema mismatch");
        assert!(matches!(err, WriterError::SchemaMismatch { ref table, .. } if table == "agent_structure.flows"));

        let runs: i64 = sqlx::query("SELECT COUNT(*) AS count FROM export_run")
            .fetch_one(writer.pool())
            .await
            .expect("count runs")
            .get("count");
        assert_eq!(runs, 0);

        let intents: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master WHERE name = 'agent_structure.intents'",
        )
        .fetch_one(writer.pool())
        .await
        .expect("lookup intents table")
        .get("count");
        assert_eq!(intents, 0, "tables created earlier in the same append are rolled back");
    }
}
