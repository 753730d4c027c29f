//! Scan sessions driven by a scripted backend: stage failures, report contract,
//! finding order and exit codes.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use securityscan::app::{ScanOutcome, ScanSession};
use securityscan::config::ScanSettings;
use securityscan::core::error::{Result, ScanError};
use securityscan::core::models::{FetchResult, HeaderBag, HttpVersion, Target, TlsInfo};
use securityscan::core::scanner::headers_scanner::{HeaderPolicy, HeadersScanner};
use securityscan::core::scanner::{Analyzers, ScanBackend};
use securityscan::core::scanner::fetch::FetchOptions;
use securityscan::ui::Console;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const SECURE_HEADERS: &[(&str, &str)] = &[
    ("Content-Security-Policy", "default-src 'self'"),
    ("X-Frame-Options", "DENY"),
    ("X-Content-Type-Options", "nosniff"),
    ("Referrer-Policy", "no-referrer"),
    ("Strict-Transport-Security", "max-age=31536000"),
    ("Permissions-Policy", "camera=()"),
    ("Cross-Origin-Opener-Policy", "same-origin"),
];

#[derive(Clone)]
enum Tls {
    Session(TlsInfo),
    Refused,
    Broken,
}

#[derive(Clone)]
struct ScriptedBackend {
    headers: Vec<(String, String)>,
    body: Option<String>,
    fetch_fails: bool,
    ports: std::result::Result<Vec<u16>, String>,
    ports_panic: bool,
    tls: Tls,
}

impl ScriptedBackend {
    fn serving(headers: &[(&str, &str)]) -> Self {
        Self {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
            fetch_fails: false,
            ports: Ok(vec![]),
            ports_panic: false,
            tls: Tls::Session(healthy_tls()),
        }
    }
}

#[async_trait]
impl ScanBackend for ScriptedBackend {
    async fn fetch(&self, _target: &Target) -> Result<FetchResult> {
        if self.fetch_fails {
            return Err(ScanError::Fetch {
                attempts: 7,
                message: "connection refused".into(),
            });
        }
        Ok(FetchResult {
            status: 200,
            headers: self.headers.iter().cloned().collect::<HeaderBag>(),
            body: self.body.clone(),
            http_version: HttpVersion::Http2,
        })
    }

    async fn scan_ports(&self, _host: &str) -> Result<Vec<u16>> {
        if self.ports_panic {
            panic!("port table corrupted");
        }
        self.ports.clone().map_err(ScanError::Unexpected)
    }

    async fn inspect_tls(&self, _host: &str) -> Result<TlsInfo> {
        match &self.tls {
            Tls::Session(info) => Ok(info.clone()),
            Tls::Refused => Err(ScanError::Connect("handshake timed out".into())),
            Tls::Broken => Err(ScanError::Unexpected("inspector crashed".into())),
        }
    }
}

fn healthy_tls() -> TlsInfo {
    TlsInfo {
        protocol_version: "TLSv1.3".into(),
        cipher_suite: "TLS13_AES_128_GCM_SHA256".into(),
        expires_at: Some(Utc::now() + TimeDelta::days(90)),
    }
}

fn settings(url: &str, dir: &Path, quick: bool) -> ScanSettings {
    ScanSettings {
        url: url.into(),
        fetch: FetchOptions::default(),
        quick,
        ports: vec![80, 443],
        port_timeout: Duration::from_millis(10),
        tls_timeout: Duration::from_millis(10),
        reports_dir: dir.to_path_buf(),
        json_out: None,
        color: false,
    }
}

async fn run(settings: ScanSettings, backend: ScriptedBackend) -> (ScanOutcome, String) {
    let console = Console::new(Vec::new(), false, 100);
    let (outcome, console) = ScanSession::new(settings, backend, console).execute().await;
    (outcome, String::from_utf8(console.into_inner()).unwrap())
}

/// Asserts the directory holds exactly one report and returns it.
fn single_report(dir: &Path) -> (PathBuf, Value) {
    let files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1, "expected one report, found {files:?}");
    let json: Value = serde_json::from_str(&fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert!(json.get("target").is_some());
    assert!(json.get("findings").is_some());
    (files[0].clone(), json)
}

fn pairs(json: &Value, field: &str) -> Vec<String> {
    json["findings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f[field].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn fetch_failure_writes_error_only_report() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend {
        fetch_fails: true,
        ..ScriptedBackend::serving(&[])
    };

    let (outcome, out) = run(settings("example.com", dir.path(), false), backend).await;

    let (path, json) = single_report(dir.path());
    assert_eq!(path, outcome.report_path);
    assert_eq!(json["target"], "https://example.com");
    assert_eq!(json["http_version"], "2.0");
    assert!(json["error"].as_str().unwrap().contains("connection refused"));
    assert!(json["findings"].as_array().unwrap().is_empty());
    assert_eq!(outcome.exit_code, 1);
    assert!(out.contains("HTTP error"));
    assert!(out.contains(&path.display().to_string()));
}

#[tokio::test]
async fn forced_http1_is_reported_when_fetch_fails() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings("https://example.com", dir.path(), true);
    settings.fetch.force_http1 = true;
    let backend = ScriptedBackend {
        fetch_fails: true,
        ..ScriptedBackend::serving(&[])
    };

    let (outcome, out) = run(settings, backend).await;

    assert_eq!(outcome.report.http_version, HttpVersion::Http11);
    assert!(out.contains("(HTTP/1.1)"));
    single_report(dir.path());
}

#[tokio::test]
async fn tls_connect_failure_omits_tls_section() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend {
        tls: Tls::Refused,
        ..ScriptedBackend::serving(SECURE_HEADERS)
    };

    let (outcome, out) = run(settings("https://example.com", dir.path(), false), backend).await;

    let (_, json) = single_report(dir.path());
    assert!(json.get("error").is_none());
    assert!(json["findings"].as_array().unwrap().is_empty());
    assert_eq!(outcome.exit_code, 0);
    assert!(out.contains("Could not read TLS"));
    assert!(!out.contains("TLS Info"));
}

#[tokio::test]
async fn unexpected_failure_keeps_partial_findings() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend {
        ports: Err("socket table exhausted".into()),
        ..ScriptedBackend::serving(&[("X-Content-Type-Options", "nosniff")])
    };

    let (outcome, out) = run(settings("https://example.com", dir.path(), false), backend).await;

    let (_, json) = single_report(dir.path());
    assert!(json["error"].as_str().unwrap().contains("socket table exhausted"));
    assert!(pairs(&json, "area").iter().any(|a| a == "header"));
    assert_eq!(outcome.exit_code, 1);
    assert!(out.contains("Unexpected error"));
}

#[tokio::test]
async fn panicking_stage_still_writes_one_report() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend {
        ports_panic: true,
        ..ScriptedBackend::serving(&[("X-Content-Type-Options", "nosniff")])
    };

    let (outcome, out) = run(settings("https://example.com", dir.path(), false), backend).await;

    let (path, json) = single_report(dir.path());
    assert_eq!(path, outcome.report_path);
    assert!(outcome.report_written);
    assert!(json["error"].as_str().unwrap().contains("port table corrupted"));
    assert!(pairs(&json, "area").iter().any(|a| a == "header"));
    assert_eq!(outcome.exit_code, 1);
    assert!(out.contains("Unexpected error"));
}

#[tokio::test]
async fn broken_tls_inspector_is_unexpected() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend {
        tls: Tls::Broken,
        ports: Ok(vec![443]),
        ..ScriptedBackend::serving(SECURE_HEADERS)
    };

    let (outcome, _) = run(settings("https://example.com", dir.path(), false), backend).await;

    let (_, json) = single_report(dir.path());
    assert!(json["error"].as_str().unwrap().contains("inspector crashed"));
    assert_eq!(pairs(&json, "name"), ["open_ports"]);
    assert_eq!(outcome.exit_code, 1);
}

#[tokio::test]
async fn clean_target_exits_zero() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend {
        ports: Ok(vec![443]),
        ..ScriptedBackend::serving(SECURE_HEADERS)
    };

    let (outcome, out) = run(settings("https://example.com", dir.path(), false), backend).await;

    let (_, json) = single_report(dir.path());
    assert_eq!(json["http_version"], "2.0");
    assert_eq!(pairs(&json, "severity"), ["info"]);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.summary.actionable(), 0);
    assert!(out.contains("Headers: no findings"));
    assert!(out.contains("Scan finished: no findings"));
}

#[tokio::test]
async fn invalid_nosniff_yields_seven_findings() {
    let dir = TempDir::new().unwrap();
    let backend = ScriptedBackend::serving(&[("X-Content-Type-Options", "invalid")]);

    let (outcome, out) = run(settings("https://example.com", dir.path(), true), backend).await;

    let (_, json) = single_report(dir.path());
    let findings = json["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 7);
    for f in findings {
        match f["type"].as_str().unwrap() {
            "weak" => {
                assert_eq!(f["name"], "X-Content-Type-Options");
                assert_eq!(f["severity"], "low");
            }
            "missing" => assert_eq!(f["severity"], "medium"),
            other => panic!("unexpected finding type {other}"),
        }
    }
    assert_eq!(outcome.exit_code, 1);
    assert!(out.contains("Scan finished with 7 findings"));
    assert!(out.contains("Remediation"));
}

#[tokio::test]
async fn findings_follow_section_order() {
    let dir = TempDir::new().unwrap();
    let mut headers = SECURE_HEADERS.to_vec();
    headers.push(("Set-Cookie", "sid=1; Path=/"));
    headers.push(("Server", "nginx/1.25.3"));
    let backend = ScriptedBackend {
        ports: Ok(vec![80, 443]),
        tls: Tls::Session(TlsInfo {
            protocol_version: "TLSv1.1".into(),
            cipher_suite: "TLS_RSA_WITH_RC4_128_SHA".into(),
            expires_at: Some(Utc::now() - TimeDelta::days(1)),
        }),
        ..ScriptedBackend::serving(&headers)
    };

    let (outcome, _) = run(settings("https://example.com", dir.path(), false), backend).await;

    let (_, json) = single_report(dir.path());
    assert_eq!(
        pairs(&json, "area"),
        [
            "cookie",
            "cookie",
            "cookie",
            "fingerprint",
            "leak",
            "ports",
            "TLS",
            "TLS Cert",
            "Cipher"
        ]
    );
    assert_eq!(
        pairs(&json, "severity"),
        ["low", "low", "low", "info", "low", "info", "low", "critical", "low"]
    );
    assert_eq!(outcome.report.findings[5].detail, "80, 443");
    assert_eq!(outcome.summary.actionable(), 7);
}

#[tokio::test]
async fn meta_overrides_suppress_missing_headers() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings("https://example.com", dir.path(), true);
    settings.fetch.fetch_body = true;
    let headers: Vec<(&str, &str)> = SECURE_HEADERS
        .iter()
        .copied()
        .filter(|(k, _)| *k != "Content-Security-Policy" && *k != "Referrer-Policy")
        .collect();
    let backend = ScriptedBackend {
        body: Some(
            r#"<html><head>
                 <meta http-equiv="Content-Security-Policy" content="default-src 'self'">
               </head></html>"#
                .into(),
        ),
        ..ScriptedBackend::serving(&headers)
    };

    let (_, out) = run(settings, backend).await;

    let (_, json) = single_report(dir.path());
    assert_eq!(pairs(&json, "name"), ["Referrer-Policy"]);
    assert!(out.contains("Meta http-equiv detected"));
}

#[tokio::test]
async fn plain_http_target_skips_tls_and_hsts() {
    let dir = TempDir::new().unwrap();
    let headers: Vec<(&str, &str)> = SECURE_HEADERS
        .iter()
        .copied()
        .filter(|(k, _)| *k != "Strict-Transport-Security")
        .collect();
    let backend = ScriptedBackend {
        tls: Tls::Broken,
        ..ScriptedBackend::serving(&headers)
    };

    let (outcome, _) = run(settings("http://example.com", dir.path(), false), backend).await;

    let (_, json) = single_report(dir.path());
    assert!(json.get("error").is_none());
    assert_eq!(outcome.exit_code, 0);
}

#[tokio::test]
async fn absolute_json_path_is_honoured() {
    let dir = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    let target = elsewhere.path().join("custom.json");
    let mut settings = settings("https://example.com", dir.path(), true);
    settings.json_out = Some(target.clone());

    let (outcome, _) = run(settings, ScriptedBackend::serving(SECURE_HEADERS)).await;

    assert_eq!(outcome.report_path, target);
    assert!(outcome.report_written);
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    single_report(elsewhere.path());
}

#[tokio::test]
async fn analyzer_tables_can_be_substituted() {
    let dir = TempDir::new().unwrap();
    let analyzers = Analyzers {
        headers: HeadersScanner::new(HeaderPolicy::new(["X-Custom-Guard"])),
        ..Analyzers::default()
    };
    let session = ScanSession::new(
        settings("https://example.com", dir.path(), true),
        ScriptedBackend::serving(&[]),
        Console::new(Vec::new(), false, 100),
    )
    .with_analyzers(analyzers);

    let (outcome, _) = session.execute().await;

    let names: Vec<&str> = outcome
        .report
        .findings
        .iter()
        .map(|f| f.subject.as_str())
        .collect();
    assert_eq!(names, ["X-Custom-Guard"]);
    single_report(dir.path());
}
