//! # securityscan
//!
//! Best-effort web security reconnaissance against a single target: HTTP
//! security headers, `Set-Cookie` flags, `<meta http-equiv>` overrides,
//! technology fingerprint and version leaks, common web ports and the
//! negotiated TLS session.
//!
//! One invocation produces one JSON report, written whether the scan
//! succeeded, could not fetch the target, or failed half-way.
//!
//! ## Layout
//!
//! 1. **[`core::scanner`]** - the probes ([`core::scanner::ScanBackend`]) and
//!    the pure analyzers.
//! 2. **[`core::aggregator`]** - severity policy and deterministic ordering.
//! 3. **[`app`]** - [`app::ScanSession`], which runs the stages and decides
//!    which failures abort the scan.
//! 4. **[`report`]** and **[`ui`]** - the JSON artifact and the console tables.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod report;
pub mod ui;
