// src/core/scanner/ssl_scanner.rs

use crate::core::error::{Result, ScanError};
use crate::core::models::{AnalysisFinding, FindingKind, TlsInfo};
use chrono::{DateTime, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    ClientConfig, ClientConnection, DigitallySignedStruct, ProtocolVersion, RootCertStore,
    SignatureScheme,
};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info, warn};
use x509_parser::prelude::*;

pub const WEAK_PROTOCOLS: &[&str] = &["TLSv1", "TLSv1.1", "SSLv3"];
pub const WEAK_CIPHER_MARKERS: &[&str] = &["RC4", "3DES"];
pub const EXPIRY_WARNING_DAYS: i64 = 30;
pub const HTTPS_PORT: u16 = 443;
pub const DEFAULT_TLS_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a TLS session to the target and reads what was negotiated.
#[derive(Debug, Clone)]
pub struct TlsInspector {
    port: u16,
    timeout: Duration,
    verify: bool,
}

impl TlsInspector {
    pub fn new(port: u16, timeout: Duration, verify: bool) -> Self {
        Self {
            port,
            timeout,
            verify,
        }
    }

    pub async fn inspect(&self, host: &str) -> Result<TlsInfo> {
        info!(host, port = self.port, "Starting TLS inspection.");
        let host_owned = host.to_string();
        let inspector = self.clone();

        debug!("Spawning blocking task for TLS connection.");
        let info = spawn_blocking(move || inspector.perform_tls_scan(&host_owned))
            .await
            .unwrap_or_else(|e| {
                error!(panic = %e, "Blocking TLS task failed.");
                Err(ScanError::Connect(format!("TLS task failed: {}", e)))
            })?;

        info!(
            version = %info.protocol_version,
            cipher = %info.cipher_suite,
            expires_at = ?info.expires_at,
            "TLS inspection finished."
        );
        Ok(info)
    }

    fn perform_tls_scan(&self, host: &str) -> Result<TlsInfo> {
        let addrs = (host, self.port)
            .to_socket_addrs()
            .map_err(|e| ScanError::Connect(format!("cannot resolve {}: {}", host, e)))?;
        let mut stream = connect_any(host, addrs, self.timeout)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| stream.set_write_timeout(Some(self.timeout)))
            .map_err(|e| ScanError::Connect(format!("socket setup error: {}", e)))?;

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ScanError::Connect(format!("invalid server name {}: {}", host, e)))?;
        let mut conn = ClientConnection::new(Arc::new(client_config(self.verify)?), server_name)
            .map_err(|e| ScanError::Connect(format!("TLS setup error: {}", e)))?;

        debug!(host, "Performing TLS handshake.");
        let outcome = handshake(&mut conn, &mut stream);

        conn.send_close_notify();
        let _ = conn.complete_io(&mut stream);
        let _ = stream.shutdown(Shutdown::Both);

        outcome
    }
}

/// Tries every resolved address in order and keeps the first that connects.
fn connect_any<I>(host: &str, addrs: I, timeout: Duration) -> Result<TcpStream>
where
    I: IntoIterator<Item = SocketAddr>,
{
    let mut last_error = None;
    for addr in addrs {
        debug!(%addr, "Connecting TCP stream.");
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%addr, error = %e, "Address unreachable.");
                last_error = Some(e);
            }
        }
    }
    Err(match last_error {
        Some(e) => ScanError::Connect(format!("TCP connection error: {}", e)),
        None => ScanError::Connect(format!("no address for {}", host)),
    })
}

fn handshake(conn: &mut ClientConnection, stream: &mut TcpStream) -> Result<TlsInfo> {
    while conn.is_handshaking() {
        conn.complete_io(stream).map_err(|e| {
            warn!(error = %e, "TLS handshake failed.");
            ScanError::Connect(format!("TLS handshake error: {}", e))
        })?;
    }

    let protocol_version = conn
        .protocol_version()
        .map(protocol_name)
        .unwrap_or_default();
    let cipher_suite = conn
        .negotiated_cipher_suite()
        .map(|suite| format!("{:?}", suite.suite()))
        .unwrap_or_default();
    let expires_at = conn
        .peer_certificates()
        .and_then(|chain| chain.first())
        .and_then(|leaf| certificate_expiry(leaf.as_ref()));

    Ok(TlsInfo {
        protocol_version,
        cipher_suite,
        expires_at,
    })
}

fn client_config(verify: bool) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ScanError::Connect(format!("TLS config error: {}", e)))?;

    let config = if verify {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    } else {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
            .with_no_client_auth()
    };
    Ok(config)
}

/// Lab-only verifier: any chain is accepted, handshake signatures are still checked.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// OpenSSL-style protocol names.
fn protocol_name(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::SSLv3 => "SSLv3".to_string(),
        ProtocolVersion::TLSv1_0 => "TLSv1".to_string(),
        ProtocolVersion::TLSv1_1 => "TLSv1.1".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        other => format!("{:?}", other),
    }
}

/// `notAfter` of a DER certificate; `None` when it cannot be parsed.
pub fn certificate_expiry(der: &[u8]) -> Option<DateTime<Utc>> {
    match parse_x509_certificate(der) {
        Ok((_, x509)) => {
            debug!(subject = %x509.subject(), issuer = %x509.issuer(), "Parsed peer certificate.");
            asn1_time_to_chrono_utc(&x509.validity().not_after)
        }
        Err(e) => {
            warn!(error = %e, "Could not parse peer certificate.");
            None
        }
    }
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

/// Classifies a TLS session: protocol, then certificate, then cipher.
pub fn classify(info: &TlsInfo, now: DateTime<Utc>) -> Vec<AnalysisFinding> {
    let mut analyses = Vec::new();

    if WEAK_PROTOCOLS.contains(&info.protocol_version.as_str()) {
        analyses.push(AnalysisFinding::new(
            FindingKind::Weak,
            "TLS",
            format!("Obsolete protocol {}", info.protocol_version),
        ));
    }

    if let Some(expires_at) = info.expires_at {
        if expires_at <= now {
            debug!(%expires_at, "Certificate expired.");
            analyses.push(AnalysisFinding::new(
                FindingKind::Critical,
                "TLS Cert",
                "Certificate expired",
            ));
        } else {
            let days_left = (expires_at - now).num_days();
            if days_left < EXPIRY_WARNING_DAYS {
                debug!(days_left, "Certificate expiring soon.");
                analyses.push(AnalysisFinding::new(
                    FindingKind::Warn,
                    "TLS Cert",
                    format!("Certificate expires in {} days", days_left),
                ));
            }
        }
    }

    let cipher = info.cipher_suite.to_ascii_uppercase();
    if WEAK_CIPHER_MARKERS.iter().any(|bad| cipher.contains(bad)) {
        analyses.push(AnalysisFinding::new(
            FindingKind::Weak,
            "Cipher",
            format!("Weak cipher suite {}", info.cipher_suite),
        ));
    }

    analyses
}
