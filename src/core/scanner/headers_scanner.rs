// src/core/scanner/headers_scanner.rs

use crate::core::models::{AnalysisFinding, FindingKind, HeaderBag, Target};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const STRICT_TRANSPORT_SECURITY: &str = "Strict-Transport-Security";
pub const CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
pub const X_FRAME_OPTIONS: &str = "X-Frame-Options";
pub const X_CONTENT_TYPE_OPTIONS: &str = "X-Content-Type-Options";
pub const REFERRER_POLICY: &str = "Referrer-Policy";

/// Security headers every response is expected to carry.
pub const SEC_HEADERS_REQUIRED: &[&str] = &[
    CONTENT_SECURITY_POLICY,
    X_FRAME_OPTIONS,
    X_CONTENT_TYPE_OPTIONS,
    REFERRER_POLICY,
    STRICT_TRANSPORT_SECURITY,
    "Permissions-Policy",
    "Cross-Origin-Opener-Policy",
];

/// Headers that a `<meta http-equiv>` tag can stand in for.
const META_SEC_HEADERS: &[(&str, &str)] = &[
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("referrer-policy", REFERRER_POLICY),
];

/// The set of headers the analyzer requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderPolicy {
    required: Vec<String>,
}

impl HeaderPolicy {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::new(SEC_HEADERS_REQUIRED.iter().copied())
    }
}

/// Evaluates response headers against a [`HeaderPolicy`].
#[derive(Debug, Clone, Default)]
pub struct HeadersScanner {
    policy: HeaderPolicy,
}

impl HeadersScanner {
    pub fn new(policy: HeaderPolicy) -> Self {
        Self { policy }
    }

    /// Missing-header findings in policy order, followed by weak-value findings.
    ///
    /// `Strict-Transport-Security` is only required on `https` targets.
    pub fn analyze(&self, target: &Target, headers: &HeaderBag) -> Vec<AnalysisFinding> {
        debug!(headers = headers.len(), "Analyzing response headers.");
        let mut analyses = Vec::new();

        for name in self.policy.required() {
            if headers.contains(name) {
                continue;
            }
            if name.eq_ignore_ascii_case(STRICT_TRANSPORT_SECURITY) && !target.is_https() {
                debug!("HSTS not required on a plain HTTP target.");
                continue;
            }
            analyses.push(AnalysisFinding::new(FindingKind::Missing, name, "Header missing"));
        }

        if let Some(xcto) = headers.get(X_CONTENT_TYPE_OPTIONS) {
            if !xcto.trim().eq_ignore_ascii_case("nosniff") {
                let shown = if xcto.is_empty() { "N/A" } else { xcto };
                analyses.push(AnalysisFinding::new(
                    FindingKind::Weak,
                    X_CONTENT_TYPE_OPTIONS,
                    format!("Value '{}' (recommended: nosniff)", shown),
                ));
            }
        }

        if let Some(xfo) = headers.get(X_FRAME_OPTIONS) {
            let value = xfo.trim().to_ascii_lowercase();
            if value != "deny" && value != "sameorigin" {
                analyses.push(AnalysisFinding::new(
                    FindingKind::Weak,
                    X_FRAME_OPTIONS,
                    format!("Value '{}' (recommended: DENY or SAMEORIGIN)", xfo),
                ));
            }
        }

        if let Some(csp) = headers.get(CONTENT_SECURITY_POLICY).filter(|v| !v.is_empty()) {
            if csp.contains("unsafe-inline") {
                analyses.push(AnalysisFinding::new(
                    FindingKind::Weak,
                    CONTENT_SECURITY_POLICY,
                    "Contains unsafe-inline",
                ));
            }
            if csp.contains("script-src") && has_wildcard_source(csp) {
                analyses.push(AnalysisFinding::new(
                    FindingKind::Weak,
                    CONTENT_SECURITY_POLICY,
                    "script-src too permissive (wildcard source)",
                ));
            }
        }

        debug!(findings = analyses.len(), "Header analysis finished.");
        analyses
    }
}

/// A bare `*` source anywhere in the policy.
fn has_wildcard_source(csp: &str) -> bool {
    csp.split(|c: char| c == ';' || c.is_whitespace())
        .any(|token| token == "*")
}

/// Collects `<meta http-equiv>` stand-ins for CSP and Referrer-Policy.
///
/// Keys are canonical header names. Anything unparsable yields an empty map.
pub fn analyze_meta_overrides(html: &str) -> BTreeMap<String, String> {
    let mut overrides = BTreeMap::new();
    if html.trim().is_empty() {
        return overrides;
    }

    let selector = match Selector::parse("meta") {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "Could not build meta selector.");
            return overrides;
        }
    };

    let document = Html::parse_document(html);
    for meta in document.select(&selector) {
        let element = meta.value();
        let equiv = element
            .attr("http-equiv")
            .or_else(|| element.attr("http_equiv"))
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let Some((_, header)) = META_SEC_HEADERS.iter().find(|(key, _)| *key == equiv) else {
            continue;
        };
        if let Some(content) = element.attr("content") {
            debug!(header, content, "Meta http-equiv override found.");
            overrides.insert(header.to_string(), content.trim().to_string());
        }
    }
    overrides
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::target::normalize;

    fn subjects(findings: &[AnalysisFinding], kind: FindingKind) -> Vec<&str> {
        findings
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| f.subject.as_str())
            .collect()
    }

    #[test]
    fn reports_missing_and_weak_headers() {
        let target = normalize("https://example.com");
        let headers: HeaderBag = [("X-Content-Type-Options", "invalid")].into_iter().collect();

        let findings = HeadersScanner::default().analyze(&target, &headers);

        assert_eq!(findings.len(), 7);
        assert_eq!(subjects(&findings, FindingKind::Weak), [X_CONTENT_TYPE_OPTIONS]);
        let missing = subjects(&findings, FindingKind::Missing);
        for expected in [
            "Content-Security-Policy",
            "Strict-Transport-Security",
            "Referrer-Policy",
            "Cross-Origin-Opener-Policy",
            "Permissions-Policy",
            "X-Frame-Options",
        ] {
            assert!(missing.contains(&expected), "{expected} should be missing");
        }
    }

    #[test]
    fn hsts_not_required_over_plain_http() {
        let target = normalize("http://example.com");
        let findings = HeadersScanner::default().analyze(&target, &HeaderBag::new());

        let missing = subjects(&findings, FindingKind::Missing);
        assert_eq!(missing.len(), SEC_HEADERS_REQUIRED.len() - 1);
        assert!(!missing.contains(&STRICT_TRANSPORT_SECURITY));
    }

    #[test]
    fn one_missing_finding_per_absent_header() {
        let target = normalize("http://example.com");
        let headers: HeaderBag = [
            ("content-security-policy", "default-src 'self'"),
            ("x-frame-options", "DENY"),
            ("x-content-type-options", "nosniff"),
        ]
        .into_iter()
        .collect();

        let findings = HeadersScanner::default().analyze(&target, &headers);
        assert_eq!(
            subjects(&findings, FindingKind::Missing),
            ["Referrer-Policy", "Permissions-Policy", "Cross-Origin-Opener-Policy"]
        );
        assert!(subjects(&findings, FindingKind::Weak).is_empty());
    }

    #[test]
    fn weak_frame_options_and_csp() {
        let target = normalize("https://example.com");
        let headers: HeaderBag = [
            ("X-Frame-Options", "ALLOW-FROM https://evil.example"),
            (
                "Content-Security-Policy",
                "default-src 'self'; script-src * 'unsafe-inline'",
            ),
        ]
        .into_iter()
        .collect();

        let findings = HeadersScanner::default().analyze(&target, &headers);
        let weak = subjects(&findings, FindingKind::Weak);
        assert_eq!(
            weak,
            [X_FRAME_OPTIONS, CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY]
        );
    }

    #[test]
    fn scoped_wildcard_host_is_not_unrestricted() {
        let target = normalize("https://example.com");
        let headers: HeaderBag = [("Content-Security-Policy", "script-src https://*.example.com")]
            .into_iter()
            .collect();
        let findings = HeadersScanner::default().analyze(&target, &headers);
        assert!(subjects(&findings, FindingKind::Weak).is_empty());
    }

    #[test]
    fn policy_can_be_substituted() {
        let target = normalize("https://example.com");
        let scanner = HeadersScanner::new(HeaderPolicy::new(["X-Custom-Guard"]));
        let findings = scanner.analyze(&target, &HeaderBag::new());
        assert_eq!(subjects(&findings, FindingKind::Missing), ["X-Custom-Guard"]);
    }

    #[test]
    fn detects_meta_http_equiv() {
        let html = r#"
        <html><head>
          <meta http-equiv="Content-Security-Policy" content="default-src 'self'">
          <META HTTP-EQUIV="referrer-policy" CONTENT=" no-referrer ">
          <meta http-equiv="refresh" content="5">
        </head><body></body></html>
        "#;
        let meta = analyze_meta_overrides(html);
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[CONTENT_SECURITY_POLICY], "default-src 'self'");
        assert_eq!(meta[REFERRER_POLICY], "no-referrer");
    }

    #[test]
    fn malformed_html_degrades_to_empty() {
        assert!(analyze_meta_overrides("").is_empty());
        assert!(analyze_meta_overrides("<<<meta http-equiv=>>").is_empty());
        assert!(analyze_meta_overrides("\u{0}\u{1}not html at all").is_empty());
    }
}
