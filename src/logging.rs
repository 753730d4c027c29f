// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::path::PathBuf;
use tracing_error::ErrorLayer;
use tracing_subscriber::{self, EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase();
    pub static ref DATA_ENV: String = format!("{}_DATA", PROJECT_NAME.as_str());
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", PROJECT_NAME.as_str());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "devx", env!("CARGO_PKG_NAME"))
}

/// `$SECURITYSCAN_DATA`, else the platform's local data dir, else `./.data`.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_ENV.as_str()).filter(|d| !d.is_empty()) {
        PathBuf::from(dir)
    } else if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

/// Filter directive: `RUST_LOG`, then `$SECURITYSCAN_LOGLEVEL`, then `securityscan=info`.
pub fn log_filter() -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(LOG_ENV.as_str()))
        .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")))
}

/// Sends tracing events to `<data dir>/securityscan.log`. The console stays
/// reserved for the scan tables.
pub fn initialize_logging() -> Result<PathBuf> {
    let directory = get_data_dir();
    std::fs::create_dir_all(&directory)?;
    let log_path = directory.join(LOG_FILE.as_str());
    let log_file = std::fs::File::create(&log_path)?;

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(log_filter()));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(log_path)
}
