// src/core/scanner/port_scanner.rs

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

pub const COMMON_WEB_PORTS: &[u16] = &[80, 443, 8080, 8443, 8000, 3000];
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_millis(300);

/// Conventional service behind a common web port, for display.
pub fn service_hint(port: u16) -> &'static str {
    match port {
        80 => "http",
        443 => "https",
        8080 | 8000 => "http-alt",
        8443 => "https-alt",
        3000 => "dev server",
        _ => "",
    }
}

/// Best-effort liveness probe of a handful of web ports.
#[derive(Debug, Clone)]
pub struct PortScanner {
    ports: Vec<u16>,
    timeout: Duration,
}

impl Default for PortScanner {
    fn default() -> Self {
        Self::new(COMMON_WEB_PORTS.to_vec(), DEFAULT_PORT_TIMEOUT)
    }
}

impl PortScanner {
    pub fn new(ports: Vec<u16>, timeout: Duration) -> Self {
        Self { ports, timeout }
    }

    /// Connects to each port in turn; open ports are returned in probe order.
    ///
    /// A refused, unreachable or timed-out port is skipped and never stops the scan.
    pub async fn scan(&self, host: &str) -> Vec<u16> {
        info!(host, ports = ?self.ports, "Starting port scan.");
        let mut open = Vec::new();

        for &port in &self.ports {
            match timeout(self.timeout, TcpStream::connect((host, port))).await {
                Ok(Ok(stream)) => {
                    debug!(port, "Port open.");
                    drop(stream);
                    open.push(port);
                }
                Ok(Err(e)) => debug!(port, error = %e, "Port closed."),
                Err(_) => debug!(port, "Port timed out."),
            }
        }

        info!(open = ?open, "Port scan finished.");
        open
    }
}
