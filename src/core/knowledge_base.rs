//! Static remediation advice for every finding subject the scanner can emit.
//!
//! The console looks findings up here by subject to print a "how to fix"
//! table after the scan. Subjects with no entry (ports, detected technologies)
//! are informational and need no advice.

use std::fmt;

/// Groups advice entries for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// HTTP response security headers.
    Header,
    /// `Set-Cookie` attributes.
    Cookie,
    /// Version numbers exposed by identity headers.
    Leak,
    /// TLS protocol, certificate and cipher.
    Tls,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Header => write!(f, "HTTP Security Headers"),
            FindingCategory::Cookie => write!(f, "Cookies"),
            FindingCategory::Leak => write!(f, "Information Leaks"),
            FindingCategory::Tls => write!(f, "TLS"),
        }
    }
}

/// How a subject matches an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectMatch {
    /// Case-insensitive equality.
    Exact(&'static str),
    /// Subject starts with this prefix (e.g. `Set-Cookie <name>`).
    Prefix(&'static str),
}

impl SubjectMatch {
    fn matches(&self, subject: &str) -> bool {
        match self {
            SubjectMatch::Exact(s) => subject.eq_ignore_ascii_case(s),
            SubjectMatch::Prefix(p) => subject
                .get(..p.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(p)),
        }
    }
}

/// One piece of advice.
pub struct FindingDetail {
    /// Stable identifier, e.g. `HTTP_CSP`.
    pub code: &'static str,
    pub subject: SubjectMatch,
    pub title: &'static str,
    pub category: FindingCategory,
    /// Why the finding matters.
    pub description: &'static str,
    /// What to change on the server.
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- HTTP Security Headers ---
    FindingDetail {
        code: "HTTP_CSP",
        subject: SubjectMatch::Exact("Content-Security-Policy"),
        title: "Content Security Policy",
        category: FindingCategory::Header,
        description: "CSP restricts where scripts, styles and other resources may load from. Without a strict policy an injected script runs with the page's full privileges.",
        remediation: "Send a Content-Security-Policy with an explicit script-src (e.g. default-src 'self'; script-src 'self'). Avoid 'unsafe-inline' and bare '*' sources; use nonces or hashes for inline code.",
    },
    FindingDetail {
        code: "HTTP_XFO",
        subject: SubjectMatch::Exact("X-Frame-Options"),
        title: "Clickjacking Protection",
        category: FindingCategory::Header,
        description: "Without framing restrictions another site can embed your pages in an invisible frame and trick users into clicking.",
        remediation: "Set 'X-Frame-Options: DENY' (or SAMEORIGIN if you frame your own pages), or use the CSP directive frame-ancestors 'self'.",
    },
    FindingDetail {
        code: "HTTP_XCTO",
        subject: SubjectMatch::Exact("X-Content-Type-Options"),
        title: "MIME Sniffing",
        category: FindingCategory::Header,
        description: "Browsers may guess a response's content type and execute an upload or text file as script.",
        remediation: "Set 'X-Content-Type-Options: nosniff' on every response.",
    },
    FindingDetail {
        code: "HTTP_REFERRER",
        subject: SubjectMatch::Exact("Referrer-Policy"),
        title: "Referrer Policy",
        category: FindingCategory::Header,
        description: "Full URLs, including paths and query strings, can leak to third parties through the Referer header.",
        remediation: "Set 'Referrer-Policy: strict-origin-when-cross-origin' or stricter (no-referrer).",
    },
    FindingDetail {
        code: "HTTP_HSTS",
        subject: SubjectMatch::Exact("Strict-Transport-Security"),
        title: "HTTP Strict Transport Security",
        category: FindingCategory::Header,
        description: "Without HSTS the first request can be downgraded to plain HTTP and intercepted.",
        remediation: "Set 'Strict-Transport-Security: max-age=31536000; includeSubDomains' on HTTPS responses.",
    },
    FindingDetail {
        code: "HTTP_PERMISSIONS",
        subject: SubjectMatch::Exact("Permissions-Policy"),
        title: "Permissions Policy",
        category: FindingCategory::Header,
        description: "Powerful browser features (camera, geolocation, payment) stay available to embedded content.",
        remediation: "Send a Permissions-Policy disabling features you do not use, e.g. 'camera=(), microphone=(), geolocation=()'.",
    },
    FindingDetail {
        code: "HTTP_COOP",
        subject: SubjectMatch::Exact("Cross-Origin-Opener-Policy"),
        title: "Cross-Origin Opener Policy",
        category: FindingCategory::Header,
        description: "Pages opened cross-origin keep a handle on your window, enabling cross-window attacks such as XS-Leaks.",
        remediation: "Set 'Cross-Origin-Opener-Policy: same-origin' (or same-origin-allow-popups).",
    },
    // --- Cookies ---
    FindingDetail {
        code: "COOKIE_FLAGS",
        subject: SubjectMatch::Prefix("Set-Cookie"),
        title: "Cookie Attributes",
        category: FindingCategory::Cookie,
        description: "Cookies without Secure travel over plain HTTP, without HttpOnly are readable by scripts, and without SameSite are attached to cross-site requests.",
        remediation: "Issue session cookies with 'Secure; HttpOnly; SameSite=Lax' (Strict where the flow allows it).",
    },
    // --- Information Leaks ---
    FindingDetail {
        code: "LEAK_SERVER",
        subject: SubjectMatch::Exact("Server"),
        title: "Server Version Disclosure",
        category: FindingCategory::Leak,
        description: "Exact server versions let an attacker match the host against known vulnerabilities.",
        remediation: "Remove the version from the Server header (e.g. nginx 'server_tokens off;', Apache 'ServerTokens Prod').",
    },
    FindingDetail {
        code: "LEAK_POWERED_BY",
        subject: SubjectMatch::Exact("X-Powered-By"),
        title: "Framework Version Disclosure",
        category: FindingCategory::Leak,
        description: "X-Powered-By reveals the application framework and often its exact version.",
        remediation: "Drop the X-Powered-By header (e.g. Express 'app.disable(\"x-powered-by\")', PHP 'expose_php = Off').",
    },
    // --- TLS ---
    FindingDetail {
        code: "TLS_PROTOCOL",
        subject: SubjectMatch::Exact("TLS"),
        title: "Obsolete TLS Protocol",
        category: FindingCategory::Tls,
        description: "SSLv3, TLS 1.0 and TLS 1.1 have known weaknesses and are rejected by modern browsers.",
        remediation: "Allow only TLS 1.2 and TLS 1.3 in the server or load balancer configuration.",
    },
    FindingDetail {
        code: "TLS_CERT",
        subject: SubjectMatch::Exact("TLS Cert"),
        title: "Certificate Validity",
        category: FindingCategory::Tls,
        description: "An expired certificate breaks every client; one close to expiry will do so soon.",
        remediation: "Renew the certificate and automate renewal (e.g. ACME/Let's Encrypt) with expiry monitoring.",
    },
    FindingDetail {
        code: "TLS_CIPHER",
        subject: SubjectMatch::Exact("Cipher"),
        title: "Weak Cipher Suite",
        category: FindingCategory::Tls,
        description: "RC4 and 3DES suites are broken or too weak for current traffic volumes.",
        remediation: "Disable RC4 and 3DES; prefer AEAD suites (AES-GCM, CHACHA20-POLY1305) with forward secrecy.",
    },
];

/// Advice for a finding subject, if there is any.
pub fn remediation_for(subject: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|detail| detail.subject.matches(subject))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::headers_scanner::SEC_HEADERS_REQUIRED;

    #[test]
    fn every_required_header_has_advice() {
        for header in SEC_HEADERS_REQUIRED {
            let detail = remediation_for(header).expect(header);
            assert_eq!(detail.category, FindingCategory::Header);
        }
    }

    #[test]
    fn cookie_subjects_match_by_prefix() {
        let detail = remediation_for("Set-Cookie sessionid").unwrap();
        assert_eq!(detail.code, "COOKIE_FLAGS");
    }

    #[test]
    fn tls_subjects_are_distinct() {
        assert_eq!(remediation_for("TLS").unwrap().code, "TLS_PROTOCOL");
        assert_eq!(remediation_for("TLS Cert").unwrap().code, "TLS_CERT");
        assert_eq!(remediation_for("Cipher").unwrap().code, "TLS_CIPHER");
    }

    #[test]
    fn informational_subjects_have_no_advice() {
        assert!(remediation_for("open_ports").is_none());
        assert!(remediation_for("detected").is_none());
    }
}
