use std::fs;
use std::io::{self, Read};

use chrono::{DateTime, Utc};
use tracing::{error, info};

use flowsnap_core::config::{AppConfig, LoadOptions};
use flowsnap_core::errors::ApplicationError;
use flowsnap_core::flatten::{flatten_agent, SnapshotContext};
use flowsnap_core::source::{AgentRef, AgentSource, SnapshotDirSource};
use flowsnap_db::{
    connect_warehouse, migrations, AppendReceipt, Destination, RowSetWriter, SqlRowSetWriter,
    WriterError,
};

use crate::commands::CommandResult;
use crate::trigger::{decode_message, BatchEntry};

const COMMAND: &str = "run";

#[derive(Debug)]
pub struct BatchSummary {
    pub agents: usize,
    pub rows_written: usize,
}

#[derive(Debug)]
pub struct BatchFailure {
    pub position: usize,
    pub agent: String,
    pub error: ApplicationError,
}

/// Processes a trigger message read from `message` (a file path, or `-` for stdin).
pub fn run(message: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let decoded = read_message(message)
        .map_err(|error| format!("could not read trigger message `{message}`: {error}"))
        .and_then(|raw| decode_message(&raw).map_err(|error| error.to_string()));
    let entries = match decoded {
        Ok(entries) => entries,
        Err(reason) => return CommandResult::failure(COMMAND, "invalid_input", reason, 1),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let snapshot_at = Utc::now();
    let source = SnapshotDirSource::new(&config.source.snapshot_dir);
    match runtime.block_on(run_batch(&config, &source, &entries, snapshot_at)) {
        Ok(summary) => CommandResult::success(
            COMMAND,
            format!(
                "appended {} agent snapshot(s), {} rows, stamped {}",
                summary.agents,
                summary.rows_written,
                snapshot_at.to_rfc3339()
            ),
        ),
        Err(failure) => CommandResult::failure(
            COMMAND,
            failure.error.error_class(),
            format!(
                "batch aborted at agent #{} ({}): {}",
                failure.position, failure.agent, failure.error
            ),
            1,
        ),
    }
}

fn read_message(message: &str) -> io::Result<String> {
    if message == "-" {
        let mut raw = String::new();
        io::stdin().read_to_string(&mut raw)?;
        return Ok(raw);
    }
    fs::read_to_string(message)
}

/// Runs every entry in order with one shared stamp. The first failure stops the batch.
pub async fn run_batch<S: AgentSource>(
    config: &AppConfig,
    source: &S,
    entries: &[BatchEntry],
    snapshot_at: DateTime<Utc>,
) -> Result<BatchSummary, BatchFailure> {
    let mut summary = BatchSummary { agents: 0, rows_written: 0 };

    for (position, entry) in entries.iter().enumerate() {
        let agent_label =
            format!("{}/{}/{}", entry.agent_project_id, entry.agent_location, entry.agent_id);
        let outcome = export_entry(config, source, entry, snapshot_at).await;

        match outcome {
            Ok(receipt) => {
                summary.agents += 1;
                summary.rows_written += receipt.rows_written;
            }
            Err(error) => {
                error!(
                    event_name = "run.batch_aborted",
                    position,
                    agent = %agent_label,
                    error_class = error.error_class(),
                    error = %error,
                    "agent snapshot failed; remaining agents skipped"
                );
                return Err(BatchFailure { position, agent: agent_label, error });
            }
        }
    }

    info!(
        event_name = "run.batch_completed",
        agents = summary.agents,
        rows_written = summary.rows_written,
        "batch completed"
    );
    Ok(summary)
}

async fn export_entry<S: AgentSource>(
    config: &AppConfig,
    source: &S,
    entry: &BatchEntry,
    snapshot_at: DateTime<Utc>,
) -> Result<AppendReceipt, ApplicationError> {
    let agent = entry.agent_ref()?;
    let project = entry.destination_project()?;
    let pool = connect_warehouse(&config.warehouse, project)
        .await
        .map_err(WriterError::from)?;
    migrations::run_pending(&pool).await.map_err(WriterError::from)?;

    let writer = SqlRowSetWriter::new(pool.clone());
    let destination = Destination::new(project, &config.warehouse.namespace);
    let receipt = export_agent(source, &writer, &destination, &agent, snapshot_at).await;
    pool.close().await;
    receipt
}

/// Loads, flattens and appends one agent.
pub async fn export_agent<S: AgentSource + ?Sized>(
    source: &S,
    writer: &dyn RowSetWriter,
    destination: &Destination,
    agent: &AgentRef,
    snapshot_at: DateTime<Utc>,
) -> Result<AppendReceipt, ApplicationError> {
    let snapshot = source.load(agent)?;
    info!(
        event_name = "run.agent_loaded",
        agent_id = %agent,
        agent_name = %snapshot.agent.display_name,
        destination_project = %destination.project_id,
        "loading agent"
    );

    let context =
        SnapshotContext::new(snapshot_at, agent.path(), snapshot.agent.display_name.clone());
    let rows = flatten_agent(&snapshot, &context)?;
    Ok(writer.append(destination, &context, &rows).await?)
}
