// src/app.rs

use crate::cli::RunArgs;
use crate::config::{ScanSettings, compose_output_path};
use crate::core::aggregator::{Aggregator, Section, suppress_meta_overridden};
use crate::core::error::{Result, ScanError};
use crate::core::knowledge_base::{self, FindingDetail};
use crate::core::models::{
    AnalysisFinding, Finding, FindingKind, HttpVersion, ScanReport, Severity, Target, TlsInfo,
};
use crate::core::scanner::cookie_scanner::analyze_cookies;
use crate::core::scanner::headers_scanner::analyze_meta_overrides;
use crate::core::scanner::port_scanner::service_hint;
use crate::core::scanner::ssl_scanner;
use crate::core::scanner::target::normalize;
use crate::core::scanner::{Analyzers, ScanBackend};
use crate::report::ReportWriter;
use crate::ui::{Console, Tone};
use chrono::Utc;
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use strum::Display;
use tracing::{debug, error, info, warn};

/// Where a session currently is. Logged with every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScanStage {
    Idle,
    Fetching,
    Analyzing,
    Probing,
    Reporting,
    Finished,
}

/// Severity counts of a finished scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    counts: BTreeMap<Severity, usize>,
    pub error: Option<String>,
}

impl ScanSummary {
    pub fn new(findings: &[Finding], error: Option<String>) -> Self {
        let mut counts = BTreeMap::new();
        for finding in findings {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        Self { counts, error }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.counts.get(&severity).copied().unwrap_or(0)
    }

    /// Findings at `low` severity or worse.
    pub fn actionable(&self) -> usize {
        self.counts
            .iter()
            .filter(|(severity, _)| severity.is_actionable())
            .map(|(_, n)| n)
            .sum()
    }

    /// `0` when clean, `1` for actionable findings or a failed scan.
    pub fn exit_code(&self) -> i32 {
        if self.error.is_some() || self.actionable() > 0 {
            1
        } else {
            0
        }
    }
}

/// What one invocation left behind.
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: ScanReport,
    pub report_path: PathBuf,
    pub report_written: bool,
    pub summary: ScanSummary,
    pub exit_code: i32,
}

/// Runs the stages of one scan against a backend and prints as it goes.
pub struct ScanSession<B: ScanBackend, W: Write> {
    settings: ScanSettings,
    backend: B,
    analyzers: Analyzers,
    console: Console<W>,
    target: Target,
    writer: ReportWriter,
    aggregator: Aggregator,
    http_version: HttpVersion,
    stage: ScanStage,
}

impl<B: ScanBackend, W: Write> ScanSession<B, W> {
    pub fn new(settings: ScanSettings, backend: B, console: Console<W>) -> Self {
        let target = normalize(&settings.url);
        let report_path = compose_output_path(
            &settings.reports_dir,
            &target.host,
            settings.json_out.as_deref(),
            Utc::now(),
        );
        let http_version = settings.planned_http_version();

        Self {
            settings,
            backend,
            analyzers: Analyzers::default(),
            console,
            target,
            writer: ReportWriter::new(report_path),
            aggregator: Aggregator::new(),
            http_version,
            stage: ScanStage::Idle,
        }
    }

    pub fn with_analyzers(mut self, analyzers: Analyzers) -> Self {
        self.analyzers = analyzers;
        self
    }

    /// Runs the scan, writes the report exactly once and settles the exit code.
    pub async fn execute(mut self) -> (ScanOutcome, Console<W>) {
        info!(url = %self.target.url, host = %self.target.host, "Scan started.");
        let note = match self.http_version {
            HttpVersion::Http11 => "(HTTP/1.1)",
            HttpVersion::Http2 => "(HTTP/2 -> 1.1 fallback)",
        };
        if let Err(e) = self.console.banner(&self.target.url, note) {
            warn!(error = %e, "Could not print banner.");
        }

        let outcome = AssertUnwindSafe(self.scan())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(ScanError::Unexpected(panic_message(panic.as_ref()))));
        let error = match outcome {
            Ok(()) => None,
            Err(e) => {
                error!(stage = %self.stage, error = %e, "Scan aborted.");
                let label = if e.is_fetch() { "HTTP error" } else { "Unexpected error" };
                self.print(Tone::Error, &format!("{}: {}", label, e));
                Some(e.to_string())
            }
        };

        self.stage = ScanStage::Reporting;
        let findings = self.aggregator.findings();
        if error.is_none() {
            self.print_remediation();
        }

        let report = ScanReport {
            target: self.target.url.clone(),
            http_version: self.http_version,
            findings,
            error,
        };
        let report_path = self.writer.path().to_path_buf();
        let report_written = match self.writer.write(&report) {
            Ok(_) => {
                self.print(
                    Tone::Info,
                    &format!("JSON report saved to: {}", report_path.display()),
                );
                true
            }
            Err(e) => {
                error!(path = %report_path.display(), error = %e, "Report write failed.");
                self.print(
                    Tone::Error,
                    &format!("Could not save report to {}: {}", report_path.display(), e),
                );
                false
            }
        };

        let summary = ScanSummary::new(&report.findings, report.error.clone());
        if let Err(e) = self.console.summary(&summary) {
            warn!(error = %e, "Could not print summary.");
        }
        let exit_code = if report_written { summary.exit_code() } else { 1 };

        self.stage = ScanStage::Finished;
        info!(
            findings = report.findings.len(),
            actionable = summary.actionable(),
            exit_code,
            "Scan finished."
        );

        let outcome = ScanOutcome {
            report,
            report_path,
            report_written,
            summary,
            exit_code,
        };
        (outcome, self.console)
    }

    async fn scan(&mut self) -> Result<()> {
        self.stage = ScanStage::Fetching;
        let fetched = self.backend.fetch(&self.target).await?;
        self.http_version = fetched.http_version;
        info!(
            status = fetched.status,
            headers = fetched.headers.len(),
            version = fetched.http_version.as_str(),
            "Response received."
        );

        self.stage = ScanStage::Analyzing;
        let headers = &fetched.headers;

        // --- Headers ---
        let mut header_issues = self.analyzers.headers.analyze(&self.target, headers);
        let meta = match fetched.body.as_deref() {
            Some(html) if self.settings.fetch.fetch_body => analyze_meta_overrides(html),
            _ => BTreeMap::new(),
        };
        header_issues = suppress_meta_overridden(header_issues, &meta);

        let recorded = self.aggregator.record(Section::Headers, "header", header_issues);
        if recorded.is_empty() {
            self.console.status(Tone::Success, "Headers: no findings.")?;
        } else {
            self.console
                .findings("HTTP Security Headers", "Header", &recorded)?;
        }

        if !meta.is_empty() {
            let pairs: Vec<(String, String)> = meta.into_iter().collect();
            self.console
                .pairs("Meta http-equiv detected", ["Header", "Value"], &pairs)?;
        }

        // --- Cookies ---
        let recorded = self
            .aggregator
            .record(Section::Cookies, "cookie", analyze_cookies(headers));
        if !recorded.is_empty() {
            self.console.findings("Cookie Flags", "Cookie", &recorded)?;
        }

        // --- Fingerprint ---
        let fingerprint = self.analyzers.fingerprint.fingerprint(headers);
        let mut rows = Vec::new();
        if !fingerprint.technologies.is_empty() {
            let detected = fingerprint
                .technologies
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            rows.push(("Detected".to_string(), detected.clone()));
            self.aggregator.record(
                Section::Fingerprint,
                "fingerprint",
                [AnalysisFinding::new(FindingKind::Info, "detected", detected)],
            );
        }
        let leaks: Vec<AnalysisFinding> = fingerprint
            .leaks
            .iter()
            .map(|(header, value)| {
                rows.push((format!("Leak: {}", header), value.clone()));
                AnalysisFinding::new(FindingKind::Weak, header, value.clone())
            })
            .collect();
        self.aggregator.record(Section::Fingerprint, "leak", leaks);
        if !rows.is_empty() {
            self.console
                .pairs("Fingerprint / Info Leaks", ["Key", "Value"], &rows)?;
        }

        if self.settings.quick {
            debug!("Quick mode: ports and TLS skipped.");
            return Ok(());
        }
        self.probe().await
    }

    /// Port scan and TLS inspection run concurrently; results land in their
    /// own sections so the report order does not depend on which finishes first.
    async fn probe(&mut self) -> Result<()> {
        self.stage = ScanStage::Probing;
        let host = self.target.host.clone();
        let inspect_tls = self.target.is_https();

        let (ports, tls) = tokio::join!(self.backend.scan_ports(&host), async {
            if inspect_tls {
                Some(self.backend.inspect_tls(&host).await)
            } else {
                None
            }
        });

        let mut pending: Option<ScanError> = None;

        match ports {
            Ok(open) if open.is_empty() => {
                self.console
                    .status(Tone::Info, "No common web ports answered.")?;
            }
            Ok(open) => {
                let listed = open
                    .iter()
                    .map(u16::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                self.aggregator.record(
                    Section::Ports,
                    "ports",
                    [AnalysisFinding::new(FindingKind::Info, "open_ports", listed)],
                );
                let rows: Vec<(String, String)> = open
                    .iter()
                    .map(|p| (p.to_string(), service_hint(*p).to_string()))
                    .collect();
                self.console
                    .pairs("Open web ports", ["Port", "Service"], &rows)?;
            }
            Err(e) => {
                error!(host = %host, error = %e, "Port scan failed.");
                pending = Some(e);
            }
        }

        match tls {
            Some(Ok(info)) => self.report_tls(&info)?,
            Some(Err(ScanError::Connect(reason))) => {
                warn!(host = %host, reason = %reason, "TLS section omitted.");
                self.console
                    .status(Tone::Warning, &format!("Could not read TLS: {}", reason))?;
            }
            Some(Err(e)) => {
                error!(host = %host, error = %e, "TLS inspection failed.");
                pending.get_or_insert(e);
            }
            None => debug!("Plain HTTP target: TLS not inspected."),
        }

        match pending {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn report_tls(&mut self, info: &TlsInfo) -> Result<()> {
        let expires = info
            .expires_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        self.console.pairs(
            "TLS Info",
            ["Field", "Value"],
            &[
                ("Version".to_string(), info.protocol_version.clone()),
                ("Cipher".to_string(), info.cipher_suite.clone()),
                ("Expires".to_string(), expires),
            ],
        )?;

        let mut recorded = Vec::new();
        for issue in ssl_scanner::classify(info, Utc::now()) {
            let area = issue.subject.clone();
            recorded.extend(self.aggregator.record(Section::Tls, &area, [issue]));
        }
        if !recorded.is_empty() {
            self.console.findings("TLS Issues", "Area", &recorded)?;
        }
        Ok(())
    }

    fn print_remediation(&mut self) {
        let mut entries: Vec<(String, &'static FindingDetail)> = Vec::new();
        for subject in self.aggregator.subjects() {
            let Some(detail) = knowledge_base::remediation_for(&subject) else {
                continue;
            };
            if entries.iter().all(|(_, d)| d.code != detail.code) {
                entries.push((subject, detail));
            }
        }
        if entries.is_empty() {
            return;
        }
        if let Err(e) = self.console.remediation(&entries) {
            warn!(error = %e, "Could not print remediation.");
        }
    }

    fn print(&mut self, tone: Tone, message: &str) {
        if let Err(e) = self.console.status(tone, message) {
            warn!(error = %e, "Console write failed.");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "stage panicked".to_string()
    }
}

/// Scans the target described by `args` over the network and returns the exit code.
pub async fn run(args: RunArgs) -> i32 {
    let settings = ScanSettings::from_args(&args);
    let backend = settings.backend();
    let console = Console::stdout(settings.color);
    let (outcome, _) = ScanSession::new(settings, backend, console).execute().await;
    outcome.exit_code
}
