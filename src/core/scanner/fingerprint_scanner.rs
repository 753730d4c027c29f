// src/core/scanner/fingerprint_scanner.rs

use crate::core::models::HeaderBag;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::{debug, error};

/// Headers that identify the server stack, and the ones checked for leaks.
const IDENTITY_HEADERS: &[&str] = &["Server", "X-Powered-By"];

// Statically compiled signatures, matched case-insensitively against the
// concatenated `Server` and `X-Powered-By` values.
static RE_CLOUDFLARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)cloudflare").unwrap());
static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)nginx").unwrap());
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)apache").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)microsoft-iis").unwrap());
static RE_LITESPEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)litespeed").unwrap());
static RE_VERCEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)vercel").unwrap());
static RE_NETLIFY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)netlify").unwrap());
static RE_EXPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)express").unwrap());
static RE_FASTAPI: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)fastapi").unwrap());
static RE_PHP: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bphp\b").unwrap());
static RE_ASPNET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)asp\.net").unwrap());
static RE_NEXTJS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)next\.js").unwrap());

/// Digits separated by dots, e.g. `1.23` or `2.4.57`.
static RE_VERSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+(\.\d+)?").unwrap());

/// A named technology and the pattern that reveals it.
#[derive(Debug, Clone)]
pub struct TechSignature {
    pub name: String,
    pub pattern: Regex,
}

impl TechSignature {
    pub fn new(name: &str, pattern: Regex) -> Self {
        Self {
            name: name.to_string(),
            pattern,
        }
    }
}

/// The master list of built-in signatures.
pub fn default_signatures() -> Vec<TechSignature> {
    [
        ("Cloudflare", &RE_CLOUDFLARE),
        ("nginx", &RE_NGINX),
        ("Apache", &RE_APACHE),
        ("Microsoft-IIS", &RE_IIS),
        ("LiteSpeed", &RE_LITESPEED),
        ("Vercel", &RE_VERCEL),
        ("Netlify", &RE_NETLIFY),
        ("Express", &RE_EXPRESS),
        ("FastAPI", &RE_FASTAPI),
        ("PHP", &RE_PHP),
        ("ASP.NET", &RE_ASPNET),
        ("Next.js", &RE_NEXTJS),
    ]
    .into_iter()
    .map(|(name, re)| TechSignature::new(name, Regex::clone(re)))
    .collect()
}

/// What the identity headers give away.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fingerprint {
    /// Detected technologies, sorted by name.
    pub technologies: BTreeSet<String>,
    /// `(header, value)` pairs exposing a version number, in header order.
    pub leaks: Vec<(String, String)>,
}

/// Passive technology detection from response headers.
#[derive(Debug, Clone)]
pub struct FingerprintScanner {
    signatures: Vec<TechSignature>,
}

impl Default for FingerprintScanner {
    fn default() -> Self {
        Self::new(default_signatures())
    }
}

impl FingerprintScanner {
    pub fn new(signatures: Vec<TechSignature>) -> Self {
        Self { signatures }
    }

    /// Builds a scanner from `(name, regex)` pairs, e.g. loaded from user input.
    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let signatures = patterns
            .into_iter()
            .map(|(name, pattern)| {
                Regex::new(pattern)
                    .map(|re| TechSignature::new(name, re))
                    .inspect_err(|e| error!(name, error = %e, "Invalid fingerprint pattern."))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(signatures))
    }

    pub fn fingerprint(&self, headers: &HeaderBag) -> Fingerprint {
        let combined = IDENTITY_HEADERS
            .iter()
            .map(|h| headers.get(h).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");

        let technologies: BTreeSet<String> = self
            .signatures
            .iter()
            .filter(|sig| sig.pattern.is_match(&combined))
            .map(|sig| sig.name.clone())
            .collect();

        let leaks: Vec<(String, String)> = IDENTITY_HEADERS
            .iter()
            .filter_map(|h| headers.get(h).map(|v| (h.to_string(), v.to_string())))
            .filter(|(_, v)| RE_VERSION.is_match(v))
            .collect();

        debug!(
            technologies = technologies.len(),
            leaks = leaks.len(),
            "Fingerprint finished."
        );
        Fingerprint {
            technologies,
            leaks,
        }
    }
}
