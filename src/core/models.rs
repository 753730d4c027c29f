// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

// --- Classification ---

// What an analyzer observed. Serialized lowercase in the JSON report under `type`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FindingKind {
    Missing,
    Weak,
    Critical,
    Warn,
    Info,
}

// Severity assigned by the aggregator. Declared from worst to mildest so that
// the derived ordering sorts the most urgent findings first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    Warn,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Anything at `low` or worse counts towards the non-zero exit status.
    pub fn is_actionable(self) -> bool {
        self != Severity::Info
    }
}

// --- Target ---

// A normalized scan target. `host` is the registrable host used by the
// port scanner and the TLS inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub url: String,
    pub host: String,
}

impl Target {
    pub fn is_https(&self) -> bool {
        self.url.to_ascii_lowercase().starts_with("https://")
    }
}

// --- Fetch ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HttpVersion {
    #[serde(rename = "1.1")]
    #[default]
    Http11,
    #[serde(rename = "2.0")]
    Http2,
}

impl HttpVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVersion::Http11 => "1.1",
            HttpVersion::Http2 => "2.0",
        }
    }
}

/// Response headers in arrival order.
///
/// Lookups are case-insensitive and repeated headers (`Set-Cookie` in
/// particular) are all kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag {
    entries: Vec<(String, String)>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copies a reqwest header map, keeping non-UTF-8 values as a lossy string.
    pub fn from_header_map(map: &reqwest::header::HeaderMap) -> Self {
        let entries = map
            .iter()
            .map(|(name, value)| {
                let value = match value.to_str() {
                    Ok(s) => s.to_string(),
                    Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
                };
                (name.as_str().to_string(), value)
            })
            .collect();
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HeaderBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = HeaderBag::new();
        for (k, v) in iter {
            bag.append(k, v);
        }
        bag
    }
}

// The single HTTP response a scan is based on.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub status: u16,
    pub headers: HeaderBag,
    pub body: Option<String>,
    pub http_version: HttpVersion,
}

// --- Findings ---

// Raw analyzer output, before the aggregator gives it an area and a severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisFinding {
    pub kind: FindingKind,
    pub subject: String,
    pub detail: String,
}

impl AnalysisFinding {
    pub fn new(kind: FindingKind, subject: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.to_string(),
            detail: detail.into(),
        }
    }
}

// A finding as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub area: String,
    #[serde(rename = "name")]
    pub subject: String,
    pub detail: String,
    pub severity: Severity,
}

// --- TLS ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsInfo {
    pub protocol_version: String,
    pub cipher_suite: String,
    pub expires_at: Option<DateTime<Utc>>,
}

// --- Report ---

// The JSON artifact written once per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub target: String,
    pub http_version: HttpVersion,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}
