// src/config.rs

use crate::cli::RunArgs;
use crate::core::models::HttpVersion;
use crate::core::scanner::NetworkBackend;
use crate::core::scanner::fetch::{FetchOptions, Fetcher};
use crate::core::scanner::port_scanner::PortScanner;
use crate::core::scanner::ssl_scanner::{DEFAULT_TLS_TIMEOUT, HTTPS_PORT, TlsInspector};
use chrono::{DateTime, Utc};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Shared reports root of the devx toolbox.
pub const REPORTS_DIR_ENV: &str = "DEVX_REPORTS_DIR";
const REPORTS_SUBDIR: &str = "securityscan";

/// Everything one invocation needs, resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub url: String,
    pub fetch: FetchOptions,
    pub quick: bool,
    pub ports: Vec<u16>,
    pub port_timeout: Duration,
    pub tls_timeout: Duration,
    pub reports_dir: PathBuf,
    pub json_out: Option<PathBuf>,
    pub color: bool,
}

impl ScanSettings {
    pub fn from_args(args: &RunArgs) -> Self {
        let fetch = FetchOptions {
            timeout: args.timeout,
            retries: args.retries,
            force_http1: args.force_http1,
            verify_tls: !args.no_verify,
            fetch_body: args.fetch_html,
            final_attempt: !args.no_final_attempt,
            ..FetchOptions::default()
        };

        let settings = Self {
            url: args.url.clone(),
            fetch,
            quick: args.quick,
            ports: args.ports.clone(),
            port_timeout: args.port_timeout,
            tls_timeout: DEFAULT_TLS_TIMEOUT,
            reports_dir: resolve_reports_dir(args.out_dir.as_deref()),
            json_out: args.json_out.clone(),
            color: !args.no_color,
        };
        debug!(?settings, "Settings resolved.");
        settings
    }

    /// The version the scan expects to negotiate before any response arrived.
    pub fn planned_http_version(&self) -> HttpVersion {
        if self.fetch.force_http1 {
            HttpVersion::Http11
        } else {
            HttpVersion::Http2
        }
    }

    pub fn backend(&self) -> NetworkBackend {
        NetworkBackend::new(
            Fetcher::new(self.fetch.clone()),
            TlsInspector::new(HTTPS_PORT, self.tls_timeout, self.fetch.verify_tls),
            PortScanner::new(self.ports.clone(), self.port_timeout),
        )
    }
}

/// `--out-dir` wins, then `$DEVX_REPORTS_DIR/securityscan`, then `./reports/securityscan`.
pub fn resolve_reports_dir(out_dir: Option<&Path>) -> PathBuf {
    reports_dir_from(out_dir, env::var(REPORTS_DIR_ENV).ok())
}

fn reports_dir_from(out_dir: Option<&Path>, env_dir: Option<String>) -> PathBuf {
    if let Some(dir) = out_dir {
        return dir.to_path_buf();
    }
    match env_dir.filter(|d| !d.trim().is_empty()) {
        Some(dir) => PathBuf::from(dir).join(REPORTS_SUBDIR),
        None => PathBuf::from("reports").join(REPORTS_SUBDIR),
    }
}

/// Where the report goes.
///
/// An absolute `--json` path is used as-is. A relative one keeps only its file
/// name (with `.json` appended unless already present) inside `reports_dir`.
/// Without `--json` the name is `<host_with_underscores>_<UTC timestamp>.json`.
pub fn compose_output_path(
    reports_dir: &Path,
    host: &str,
    json_out: Option<&Path>,
    now: DateTime<Utc>,
) -> PathBuf {
    if let Some(requested) = json_out {
        if requested.is_absolute() {
            return requested.to_path_buf();
        }
        let name = requested
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        let name = if requested.extension().is_some_and(|ext| ext == "json") {
            name
        } else {
            format!("{}.json", name)
        };
        return reports_dir.join(name);
    }

    let stamp = now.format("%Y%m%dT%H%M%SZ");
    let slug = host.replace('.', "_");
    reports_dir.join(format!("{}_{}.json", slug, stamp))
}
