// src/report.rs
//! JSON record of what a session renamed.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::{
    fs,
    path::{
        Path,
        PathBuf
    }
};
use crate::{
    file_entry::FileEntry,
    util
};

/// Build the report by comparing where files started (`started[i]`) with
/// where `entries[i]` is now.
pub fn build_report(started: &[String], entries: &[FileEntry], version: &semver::Version, complete: bool) -> Value {
    let renamed: Vec<Value> = started
        .iter()
        .zip(entries)
        .filter(|(from, e)| **from != e.original_path)
        .map(|(from, e)| json!({ "from": from, "to": e.original_path }))
        .collect();

    // entries the manifest asked to move but that are still in place
    let pending: Vec<&FileEntry> = entries.iter().filter(|e| e.is_pending()).collect();

    json!({
        "version": 1,
        "generated_at": util::now_rfc3339(),
        "tool_version": version.to_string(),
        "complete": complete,
        "summary": {
            "total": entries.len(),
            "renamed": renamed.len(),
            "unchanged": entries.len() - renamed.len(),
            "pending": pending.len(),
        },
        "renamed": renamed,
        "pending": pending,
    })
}

/// Write `report` to `out`. If `out` is an existing directory, a
/// timestamped file name is picked inside it. Returns the path written.
pub fn write_report(out: &Path, report: &Value) -> Result<PathBuf> {
    let path = if out.is_dir() {
        out.join(format!("batch-rename_{}.json", util::now_ts_compact()))
    } else {
        out.to_path_buf()
    };
    let mut f = fs::File::create(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(&mut f, report)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
