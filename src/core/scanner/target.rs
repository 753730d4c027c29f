// src/core/scanner/target.rs

use crate::core::models::Target;
use std::net::IpAddr;
use tracing::debug;
use url::Url;

/// Normalizes user input into a [`Target`].
///
/// A missing `http://`/`https://` prefix defaults the scheme to `https`. The
/// registrable host is recomposed from its public-suffix parts; whenever the
/// URL or the host cannot be split, the raw hostname is used instead.
pub fn normalize(raw: &str) -> Target {
    let raw = raw.trim();
    let lowered = raw.to_ascii_lowercase();
    let url = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let hostname = Url::parse(&url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_matches(['[', ']']).to_string()))
        .unwrap_or_else(|| raw.to_string());

    let host = registrable_host(&hostname);
    debug!(url = %url, hostname = %hostname, host = %host, "Target normalized.");

    Target { url, host }
}

/// Joins `subdomain.domain.suffix`, omitting empty parts.
fn registrable_host(hostname: &str) -> String {
    let name = hostname.trim_end_matches('.').to_ascii_lowercase();
    if name.is_empty() || name.parse::<IpAddr>().is_ok() {
        return name;
    }

    let Some(suffix) = psl::suffix_str(&name) else {
        return name;
    };
    // Hosts that are nothing but a public suffix (or an unlisted single label).
    let Some(domain) = psl::domain_str(&name) else {
        return name;
    };

    let label = domain
        .strip_suffix(suffix)
        .map(|d| d.trim_end_matches('.'))
        .unwrap_or_default();
    let subdomain = name
        .strip_suffix(domain)
        .map(|s| s.trim_end_matches('.'))
        .unwrap_or_default();

    let parts: Vec<&str> = [subdomain, label, suffix]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        name
    } else {
        parts.join(".")
    }
}
