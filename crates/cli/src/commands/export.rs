use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;

use flowsnap_core::errors::ApplicationError;
use flowsnap_core::flatten::{flatten_agent, SnapshotContext};
use flowsnap_core::rows::RowSets;
use flowsnap_core::schema::TableKind;
use flowsnap_core::source::load_snapshot_file;

use crate::commands::CommandResult;

const COMMAND: &str = "export";

/// Flattens one snapshot file. With `out`, writes `<table suffix>.jsonl` per table.
pub fn run(
    snapshot: &Path,
    out: Option<&Path>,
    snapshot_at: Option<DateTime<Utc>>,
) -> CommandResult {
    let rows = match flatten_file(snapshot, snapshot_at.unwrap_or_else(Utc::now)) {
        Ok(rows) => rows,
        Err(error) => {
            return CommandResult::failure(COMMAND, error.error_class(), error.to_string(), 1)
        }
    };

    let Some(out) = out else {
        return CommandResult::success(COMMAND, count_summary(&rows));
    };

    match write_jsonl(&rows, out) {
        Ok(files) => CommandResult::success(
            COMMAND,
            format!("wrote {files} files to {} ({})", out.display(), count_summary(&rows)),
        ),
        Err(error) => CommandResult::failure(COMMAND, "io", format!("{error:#}"), 1),
    }
}

fn flatten_file(path: &Path, snapshot_at: DateTime<Utc>) -> Result<RowSets, ApplicationError> {
    let snapshot = load_snapshot_file(path)?;
    let context = SnapshotContext::new(
        snapshot_at,
        snapshot.agent.name.clone(),
        snapshot.agent.display_name.clone(),
    );
    Ok(flatten_agent(&snapshot, &context)?)
}

fn count_summary(rows: &RowSets) -> String {
    TableKind::ALL
        .iter()
        .map(|kind| format!("{}={}", kind.label(), rows.len_of(*kind)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_jsonl(rows: &RowSets, out: &Path) -> anyhow::Result<usize> {
    fs::create_dir_all(out).with_context(|| format!("could not create `{}`", out.display()))?;

    for kind in TableKind::ALL {
        let lines = rows
            .json_lines(kind)
            .with_context(|| format!("could not encode {} rows", kind.label()))?;
        let path = out.join(format!("{}.jsonl", kind.table_suffix()));
        let mut body = lines.join("\n");
        if !body.is_empty() {
            body.push('\n');
        }
        fs::write(&path, body).with_context(|| format!("could not write `{}`", path.display()))?;
        info!(
            event_name = "export.table_written",
            table = kind.table_suffix(),
            rows = lines.len(),
            path = %path.display(),
            "table written"
        );
    }
    Ok(TableKind::ALL.len())
}
