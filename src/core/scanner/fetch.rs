// src/core/scanner/fetch.rs

use crate::core::error::{Result, ScanError};
use crate::core::models::{FetchResult, HeaderBag, HttpVersion, Target};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response, Version, redirect};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Browser-like identity so trivial bot filters do not skew the header set.
const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const CLIENT_ACCEPT_LANGUAGE: &str = "en,es;q=0.9";
const MAX_REDIRECTS: usize = 10;

/// Knobs of the Fetch Layer.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub retries: u32,
    pub force_http1: bool,
    pub verify_tls: bool,
    pub fetch_body: bool,
    /// Whether a last unthrottled baseline GET follows an exhausted retry budget.
    pub final_attempt: bool,
    pub backoff_step: Duration,
    pub backoff_cap: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 3,
            force_http1: false,
            verify_tls: true,
            fetch_body: false,
            final_attempt: true,
            backoff_step: Duration::from_millis(250),
            backoff_cap: Duration::from_secs(1),
        }
    }
}

/// Which HTTP stack an attempt runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// ALPN-negotiated, HTTP/2 when the server offers it.
    Upgraded,
    /// HTTP/1.1 only.
    Baseline,
}

/// Position in the retry/fallback sequence. `attempt` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    TryUpgradedTransport { attempt: u32 },
    TryBaselineTransport { attempt: u32 },
    FinalAttempt,
    Failed,
}

impl FetchState {
    pub fn transport(self) -> Option<Transport> {
        match self {
            FetchState::TryUpgradedTransport { .. } => Some(Transport::Upgraded),
            FetchState::TryBaselineTransport { .. } | FetchState::FinalAttempt => {
                Some(Transport::Baseline)
            }
            FetchState::Failed => None,
        }
    }

    /// Pause after this state's attempt failed: `min(step * (attempt + 1), cap)`.
    /// The final attempt is unthrottled.
    pub fn backoff(self, step: Duration, cap: Duration) -> Option<Duration> {
        match self {
            FetchState::TryUpgradedTransport { attempt }
            | FetchState::TryBaselineTransport { attempt } => {
                Some(step.saturating_mul(attempt + 1).min(cap))
            }
            FetchState::FinalAttempt | FetchState::Failed => None,
        }
    }
}

/// The transition table of the Fetch Layer.
///
/// Every attempt under the upgraded transport, then the same budget under the
/// baseline transport, then (optionally) one final baseline GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPlan {
    budget: u32,
    upgraded: bool,
    final_attempt: bool,
}

impl FetchPlan {
    pub fn new(retries: u32, upgraded: bool, final_attempt: bool) -> Self {
        Self {
            budget: retries.max(1),
            upgraded,
            final_attempt,
        }
    }

    pub fn from_options(options: &FetchOptions) -> Self {
        Self::new(options.retries, !options.force_http1, options.final_attempt)
    }

    pub fn start(&self) -> FetchState {
        if self.upgraded {
            FetchState::TryUpgradedTransport { attempt: 0 }
        } else {
            FetchState::TryBaselineTransport { attempt: 0 }
        }
    }

    /// State to move to after `state`'s attempt failed.
    pub fn next(&self, state: FetchState) -> FetchState {
        match state {
            FetchState::TryUpgradedTransport { attempt } if attempt + 1 < self.budget => {
                FetchState::TryUpgradedTransport { attempt: attempt + 1 }
            }
            FetchState::TryUpgradedTransport { .. } => FetchState::TryBaselineTransport { attempt: 0 },
            FetchState::TryBaselineTransport { attempt } if attempt + 1 < self.budget => {
                FetchState::TryBaselineTransport { attempt: attempt + 1 }
            }
            FetchState::TryBaselineTransport { .. } if self.final_attempt => FetchState::FinalAttempt,
            FetchState::TryBaselineTransport { .. } | FetchState::FinalAttempt | FetchState::Failed => {
                FetchState::Failed
            }
        }
    }

    /// Upper bound on the number of attempts this plan can make.
    pub fn max_attempts(&self) -> u32 {
        let rounds = if self.upgraded { 2 } else { 1 };
        self.budget * rounds + u32::from(self.final_attempt)
    }
}

/// Retrieves the scan's single response.
pub struct Fetcher {
    options: FetchOptions,
}

impl Fetcher {
    pub fn new(options: FetchOptions) -> Self {
        Self { options }
    }

    /// Runs the plan until one attempt succeeds.
    ///
    /// Fails with [`ScanError::Fetch`] carrying the last transport error once
    /// every state of the plan has been tried.
    pub async fn fetch(&self, target: &Target) -> Result<FetchResult> {
        let url = request_url(&target.url);
        let plan = FetchPlan::from_options(&self.options);
        info!(url = %url, max_attempts = plan.max_attempts(), "Starting fetch.");

        let mut state = plan.start();
        let mut attempts = 0u32;
        let mut last_error: Option<reqwest::Error> = None;

        while let Some(transport) = state.transport() {
            attempts += 1;
            debug!(?state, ?transport, attempts, "Fetch attempt.");

            let probe_first = state != FetchState::FinalAttempt;
            let outcome = match self.build_client(transport) {
                Ok(client) => self.attempt(&client, &url, probe_first).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => {
                    info!(
                        status = result.status,
                        version = result.http_version.as_str(),
                        attempts,
                        "Fetch succeeded."
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(?state, error = %e, "Fetch attempt failed.");
                    if let Some(pause) =
                        state.backoff(self.options.backoff_step, self.options.backoff_cap)
                    {
                        tokio::time::sleep(pause).await;
                    }
                    last_error = Some(e);
                    state = plan.next(state);
                }
            }
        }

        Err(ScanError::Fetch {
            attempts,
            message: last_error
                .map(|e| describe_error(&e))
                .unwrap_or_else(|| "unknown HTTP error".to_string()),
        })
    }

    fn build_client(&self, transport: Transport) -> reqwest::Result<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(CLIENT_ACCEPT_LANGUAGE));
        headers.insert(CONNECTION, HeaderValue::from_static("close"));

        let mut builder = Client::builder()
            .use_rustls_tls()
            .timeout(self.options.timeout)
            .default_headers(headers)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(!self.options.verify_tls);

        if transport == Transport::Baseline {
            builder = builder.http1_only();
        }
        builder.build()
    }

    /// HEAD probe, falling back to GET on error, error status, empty headers,
    /// or when the body is wanted.
    async fn attempt(
        &self,
        client: &Client,
        url: &str,
        probe_first: bool,
    ) -> reqwest::Result<FetchResult> {
        let probed = if probe_first {
            match client.head(url).send().await {
                Ok(resp) if self.probe_is_enough(&resp) => Some(resp),
                Ok(resp) => {
                    debug!(status = %resp.status(), "HEAD probe not usable, issuing GET.");
                    None
                }
                Err(e) => {
                    debug!(error = %e, "HEAD probe failed, issuing GET.");
                    None
                }
            }
        } else {
            None
        };

        let response = match probed {
            Some(resp) => resp,
            None => client.get(url).send().await?,
        };
        self.capture(response).await
    }

    fn probe_is_enough(&self, resp: &Response) -> bool {
        resp.status().as_u16() < 400 && !resp.headers().is_empty() && !self.options.fetch_body
    }

    async fn capture(&self, response: Response) -> reqwest::Result<FetchResult> {
        let status = response.status().as_u16();
        let http_version = if response.version() == Version::HTTP_2 {
            HttpVersion::Http2
        } else {
            HttpVersion::Http11
        };
        let headers = HeaderBag::from_header_map(response.headers());
        let body = if self.options.fetch_body {
            Some(response.text().await?)
        } else {
            None
        };
        Ok(FetchResult {
            status,
            headers,
            body,
            http_version,
        })
    }
}

/// The request URL always carries a path; a bare origin gets `/`.
pub fn request_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.to_string(),
        Err(_) if url.ends_with('/') => url.to_string(),
        Err(_) => format!("{}/", url),
    }
}

/// reqwest's top-level message hides the cause (DNS, refused, certificate).
fn describe_error(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
