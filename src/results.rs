use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{BrokerError, Result};
use crate::worker::CheckReport;

/// Append-only result log, one JSON object per line.
///
/// Every append is flushed, so a crash loses at most the report being
/// written. Stands in for whatever durable store a deployment forwards
/// results to.
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    file: File,
}

impl ResultLog {
    /// Open the log at `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| BrokerError::ResultSink {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Append one report as a single JSON line.
    pub fn append(&mut self, report: &CheckReport) -> Result<()> {
        let line = serde_json::to_string(report)?;
        writeln!(self.file, "{}", line).map_err(|source| BrokerError::ResultSink {
            path: self.path.clone(),
            source,
        })?;
        self.file.flush().map_err(|source| BrokerError::ResultSink {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
