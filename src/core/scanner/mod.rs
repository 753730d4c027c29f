// src/core/scanner/mod.rs

pub mod cookie_scanner;
pub mod fetch;
pub mod fingerprint_scanner;
pub mod headers_scanner;
pub mod port_scanner;
pub mod ssl_scanner;
pub mod target;

use crate::core::error::Result;
use crate::core::models::{FetchResult, Target, TlsInfo};
use async_trait::async_trait;

use self::fetch::Fetcher;
use self::fingerprint_scanner::FingerprintScanner;
use self::headers_scanner::HeadersScanner;
use self::port_scanner::PortScanner;
use self::ssl_scanner::TlsInspector;

/// The network-facing probes of a scan.
///
/// The session only talks to the network through this trait, so tests can
/// inject failures at any stage.
#[async_trait]
pub trait ScanBackend: Send + Sync {
    /// Retrieves the one response the header, cookie and fingerprint analyzers read.
    async fn fetch(&self, target: &Target) -> Result<FetchResult>;

    /// Open web ports on `host`, in probe order.
    async fn scan_ports(&self, host: &str) -> Result<Vec<u16>>;

    /// Negotiated TLS parameters of `host`.
    async fn inspect_tls(&self, host: &str) -> Result<TlsInfo>;
}

/// The real thing: reqwest for HTTP, rustls for TLS, tokio sockets for ports.
pub struct NetworkBackend {
    fetcher: Fetcher,
    tls: TlsInspector,
    ports: PortScanner,
}

impl NetworkBackend {
    pub fn new(fetcher: Fetcher, tls: TlsInspector, ports: PortScanner) -> Self {
        Self {
            fetcher,
            tls,
            ports,
        }
    }
}

#[async_trait]
impl ScanBackend for NetworkBackend {
    async fn fetch(&self, target: &Target) -> Result<FetchResult> {
        self.fetcher.fetch(target).await
    }

    async fn scan_ports(&self, host: &str) -> Result<Vec<u16>> {
        Ok(self.ports.scan(host).await)
    }

    async fn inspect_tls(&self, host: &str) -> Result<TlsInfo> {
        self.tls.inspect(host).await
    }
}

/// The pure analyzers, each carrying its own immutable rule table.
#[derive(Debug, Clone, Default)]
pub struct Analyzers {
    pub headers: HeadersScanner,
    pub fingerprint: FingerprintScanner,
}
