//! Error types shared by the probes and the scan session.

use thiserror::Error;

/// Everything that can go wrong while scanning a single target.
///
/// Only [`ScanError::Fetch`] is fatal to a scan. [`ScanError::Connect`] is
/// recovered by omitting the TLS section.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("HTTP fetch failed after {attempts} attempt(s): {message}")]
    Fetch { attempts: u32, message: String },

    #[error("TLS connection failed: {0}")]
    Connect(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ScanError {
    /// True when the error ends the scan before any analysis could happen.
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScanError::Fetch { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
