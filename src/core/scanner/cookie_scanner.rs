// src/core/scanner/cookie_scanner.rs

use crate::core::models::{AnalysisFinding, FindingKind, HeaderBag};
use tracing::debug;

/// Attribute tokens every cookie should carry, with the finding detail when absent.
const COOKIE_FLAGS: &[(&str, &str)] = &[
    ("secure", "Missing Secure flag (cookie also sent over plain HTTP)"),
    ("httponly", "Missing HttpOnly flag"),
    ("samesite", "Missing SameSite flag (Lax/Strict)"),
];

/// Flags every `Set-Cookie` entry lacking `Secure`, `HttpOnly` or `SameSite`.
///
/// Each flag is checked independently (case-insensitive substring), so one
/// cookie yields up to three findings. The subject is `Set-Cookie <name>`.
pub fn analyze_cookies(headers: &HeaderBag) -> Vec<AnalysisFinding> {
    let mut analyses = Vec::new();

    for cookie in headers.get_all("set-cookie") {
        let name = cookie.split('=').next().unwrap_or_default().trim();
        let subject = format!("Set-Cookie {}", name);
        let attributes = cookie.to_ascii_lowercase();

        for (flag, detail) in COOKIE_FLAGS {
            if !attributes.contains(flag) {
                debug!(cookie = name, flag, "Cookie flag missing.");
                analyses.push(AnalysisFinding::new(FindingKind::Weak, &subject, *detail));
            }
        }
    }

    analyses
}
