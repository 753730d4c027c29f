// src/report.rs

use crate::core::error::Result;
use crate::core::models::ScanReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writes the JSON artifact of one invocation, at most once.
#[derive(Debug)]
pub struct ReportWriter {
    path: PathBuf,
    written: bool,
}

impl ReportWriter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes `report` to the output path, creating parent directories.
    ///
    /// Returns `Ok(false)` without touching the file when a report was already
    /// written by this writer.
    pub fn write(&mut self, report: &ScanReport) -> Result<bool> {
        if self.written {
            debug!(path = %self.path.display(), "Report already written, skipping.");
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json).inspect_err(|e| {
            warn!(path = %self.path.display(), error = %e, "Could not write report.");
        })?;

        self.written = true;
        info!(
            path = %self.path.display(),
            findings = report.findings.len(),
            error = report.error.is_some(),
            "Report written."
        );
        Ok(true)
    }
}
