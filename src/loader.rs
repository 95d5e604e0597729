use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::json;

use crate::broker::{Task, TaskId};
use crate::error::{BrokerError, Result};

/// Read the task source and build the initial backlog.
///
/// The source is a text file of Mersenne exponents, one per line, in the
/// order they should be checked. Blank lines and `#` comments are skipped;
/// duplicate exponents are dropped with a warning. Ids are ordinal: the
/// first exponent becomes task 1.
///
/// # Errors
///
/// Fails when the file cannot be read, when a line does not parse as a
/// decimal exponent, or when the source yields no tasks at all. All three
/// are startup-fatal: handing out leases from a partial or empty backlog
/// would silently strand the run.
pub fn load_tasks(path: &Path) -> Result<Vec<Task>> {
    let contents = fs::read_to_string(path).map_err(|source| BrokerError::TaskSource {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tasks = Vec::new();
    let mut seen = HashSet::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let exponent: u64 = line.parse().map_err(|_| BrokerError::InvalidExponent {
            path: path.to_path_buf(),
            line: idx + 1,
            value: line.to_string(),
        })?;

        if !seen.insert(exponent) {
            tracing::warn!(exponent, line = idx + 1, "Duplicate exponent skipped");
            continue;
        }

        let id = TaskId::new(tasks.len() as u64 + 1);
        tasks.push(Task::new(id, json!({ "exponent": exponent })));
    }

    if tasks.is_empty() {
        return Err(BrokerError::EmptySource {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(count = tasks.len(), path = %path.display(), "Loaded task source");
    Ok(tasks)
}
