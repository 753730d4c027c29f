// src/cli.rs

use crate::core::scanner::port_scanner::COMMON_WEB_PORTS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "securityscan",
    version,
    about = "Scan basic web security posture (headers, cookies, TLS, ports)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a single target and write a JSON report
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Target site (https://example.com); the scheme defaults to https
    pub url: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "10.0", value_parser = parse_seconds)]
    pub timeout: Duration,

    /// Skip port scan and TLS check (HTTP only)
    #[arg(long)]
    pub quick: bool,

    /// Attempts per transport before falling back
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Force HTTP/1.1 (disable HTTP/2)
    #[arg(long)]
    pub force_http1: bool,

    /// Disable TLS certificate verification (lab targets only)
    #[arg(long)]
    pub no_verify: bool,

    /// Fetch the HTML body and honour <meta http-equiv> CSP/Referrer-Policy
    #[arg(long)]
    pub fetch_html: bool,

    /// Skip the last unthrottled GET after the retry budget is spent
    #[arg(long)]
    pub no_final_attempt: bool,

    /// Comma-separated ports to probe
    #[arg(long, value_delimiter = ',', default_values_t = COMMON_WEB_PORTS.to_vec())]
    pub ports: Vec<u16>,

    /// Per-port connect timeout in seconds
    #[arg(long, default_value = "0.3", value_parser = parse_seconds)]
    pub port_timeout: Duration,

    /// Output JSON file name or absolute path
    #[arg(long = "json", value_name = "FILE")]
    pub json_out: Option<PathBuf>,

    /// Directory to store reports (overrides DEVX_REPORTS_DIR)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Plain output without ANSI colors
    #[arg(long)]
    pub no_color: bool,
}

fn parse_seconds(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("'{raw}' must be a positive number of seconds"));
    }
    Ok(Duration::from_secs_f64(secs))
}
