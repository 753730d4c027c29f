//! Fetch Layer against local mock servers.

use securityscan::core::error::ScanError;
use securityscan::core::models::HttpVersion;
use securityscan::core::scanner::fetch::{FetchOptions, Fetcher};
use securityscan::core::scanner::target::normalize;
use std::time::Duration;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(force_http1: bool) -> FetchOptions {
    FetchOptions {
        timeout: Duration::from_secs(5),
        retries: 1,
        force_http1,
        backoff_step: Duration::from_millis(1),
        backoff_cap: Duration::from_millis(5),
        ..FetchOptions::default()
    }
}

fn closed_port() -> u16 {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    probe.local_addr().unwrap().port()
}

#[tokio::test]
async fn head_rejected_falls_back_to_get_over_http1() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).insert_header("Server", "Apache"))
        .expect(1)
        .mount(&server)
        .await;

    let target = normalize(&server.uri());
    let result = Fetcher::new(options(true)).fetch(&target).await.unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.headers.get("server"), Some("Apache"));
    assert_eq!(result.http_version, HttpVersion::Http11);
    assert!(result.body.is_none());
}

#[tokio::test]
async fn successful_probe_skips_get() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Frame-Options", "DENY"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let target = normalize(&server.uri());
    let result = Fetcher::new(options(false)).fetch(&target).await.unwrap();

    assert_eq!(result.headers.get("x-frame-options"), Some("DENY"));
}

#[tokio::test]
async fn body_capture_forces_get() {
    let server = MockServer::start().await;
    let html = r#"<html><head><meta http-equiv="Content-Security-Policy" content="default-src 'self'"></head></html>"#;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).insert_header("Server", "nginx"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(&server)
        .await;

    let target = normalize(&server.uri());
    let result = Fetcher::new(FetchOptions {
        fetch_body: true,
        ..options(true)
    })
    .fetch(&target)
    .await
    .unwrap();

    assert_eq!(result.body.as_deref(), Some(html));
}

#[tokio::test]
async fn redirects_are_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/home"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(ResponseTemplate::new(200).insert_header("X-Landing", "yes"))
        .mount(&server)
        .await;

    let target = normalize(&server.uri());
    let result = Fetcher::new(options(true)).fetch(&target).await.unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(result.headers.get("x-landing"), Some("yes"));
}

#[tokio::test]
async fn exhausted_plan_reports_every_attempt() {
    let target = normalize(&format!("http://127.0.0.1:{}", closed_port()));
    let fetcher = Fetcher::new(FetchOptions {
        retries: 2,
        ..options(false)
    });

    match fetcher.fetch(&target).await {
        Err(ScanError::Fetch { attempts, message }) => {
            assert_eq!(attempts, 5);
            assert!(!message.is_empty());
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn final_attempt_can_be_turned_off() {
    let target = normalize(&format!("http://127.0.0.1:{}", closed_port()));
    let fetcher = Fetcher::new(FetchOptions {
        retries: 2,
        final_attempt: false,
        ..options(true)
    });

    let err = fetcher.fetch(&target).await.unwrap_err();
    assert!(err.is_fetch());
    assert!(matches!(err, ScanError::Fetch { attempts: 2, .. }));
}
