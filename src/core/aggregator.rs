// src/core/aggregator.rs

use crate::core::models::{AnalysisFinding, Finding, FindingKind, Severity};
use std::collections::BTreeMap;
use strum::{AsRefStr, Display};
use tracing::debug;

/// Report sections in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, AsRefStr)]
pub enum Section {
    Headers,
    Cookies,
    Fingerprint,
    Ports,
    Tls,
}

/// Severity policy, applied uniformly to every analyzer output.
pub fn severity_of(kind: FindingKind, subject_or_area: &str) -> Severity {
    match kind {
        FindingKind::Critical => Severity::Critical,
        _ if subject_or_area == "TLS Cert" => Severity::Warn,
        FindingKind::Missing => Severity::Medium,
        FindingKind::Weak => Severity::Low,
        _ => Severity::Info,
    }
}

/// Drops every `missing` header finding whose header is covered by a
/// `<meta http-equiv>` override.
pub fn suppress_meta_overridden(
    issues: Vec<AnalysisFinding>,
    overrides: &BTreeMap<String, String>,
) -> Vec<AnalysisFinding> {
    if overrides.is_empty() {
        return issues;
    }
    issues
        .into_iter()
        .filter(|issue| {
            let covered = issue.kind == FindingKind::Missing
                && overrides
                    .keys()
                    .any(|header| header.eq_ignore_ascii_case(&issue.subject));
            if covered {
                debug!(header = %issue.subject, "Missing header suppressed by meta override.");
            }
            !covered
        })
        .collect()
}

/// Collects findings per section and yields them in a fixed order, no matter
/// in which order the stages finished.
#[derive(Debug, Default)]
pub struct Aggregator {
    sections: BTreeMap<Section, Vec<Finding>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives each analysis an area and a severity, and files it under `section`.
    pub fn record<I>(&mut self, section: Section, area: &str, analyses: I) -> Vec<Finding>
    where
        I: IntoIterator<Item = AnalysisFinding>,
    {
        let recorded: Vec<Finding> = analyses
            .into_iter()
            .map(|a| Finding {
                severity: severity_of(a.kind, &a.subject),
                kind: a.kind,
                area: area.to_string(),
                subject: a.subject,
                detail: a.detail,
            })
            .collect();

        debug!(section = %section, area, count = recorded.len(), "Findings recorded.");
        self.sections
            .entry(section)
            .or_default()
            .extend(recorded.iter().cloned());
        recorded
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.sections.values().flatten().cloned().collect()
    }

    /// Distinct subjects in report order.
    pub fn subjects(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for finding in self.sections.values().flatten() {
            if !seen.contains(&finding.subject) {
                seen.push(finding.subject.clone());
            }
        }
        seen
    }
}
