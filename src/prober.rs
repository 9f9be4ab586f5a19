//! Single-endpoint HTTP health checks.

use anyhow::{Context, Result};
use std::error::Error as _;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::models::ProbeResult;

/// Performs one health check. Implementations never fail: every problem is
/// reported through the returned [`ProbeResult`].
pub trait Prober: Send + Sync + 'static {
    fn probe(&self, endpoint: &str, timeout: Duration) -> impl Future<Output = ProbeResult> + Send;
}

pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("uptime-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    async fn fetch(&self, endpoint: &str) -> Result<u16, reqwest::Error> {
        let response = self.client.get(endpoint).send().await?;
        let status = response.status().as_u16();
        // Latency covers the whole body, not just the headers.
        response.bytes().await?;
        Ok(status)
    }
}

impl Prober for HttpProber {
    async fn probe(&self, endpoint: &str, timeout: Duration) -> ProbeResult {
        if timeout.is_zero() {
            return ProbeResult::failure("Timeout must be greater than zero");
        }
        debug!(endpoint, timeout_ms = timeout.as_millis() as u64, "Running probe");

        let start = Instant::now();
        match tokio::time::timeout(timeout, self.fetch(endpoint)).await {
            Ok(Ok(status)) => ProbeResult::success(status, start.elapsed()),
            Ok(Err(e)) => ProbeResult::failure(describe(&e)),
            Err(_) => ProbeResult::failure("Request timeout"),
        }
    }
}

fn describe(err: &reqwest::Error) -> String {
    let mut cause = err.source();
    let mut root = None;
    while let Some(inner) = cause {
        root = Some(inner.to_string());
        cause = inner.source();
    }
    let root = root.unwrap_or_else(|| err.to_string());

    if err.is_timeout() {
        "Request timeout".into()
    } else if err.is_builder() {
        format!("Invalid URL: {root}")
    } else if err.is_connect() {
        format!("Connection failed: {root}")
    } else if err.is_body() || err.is_decode() {
        format!("Malformed response: {root}")
    } else {
        format!("Request failed: {root}")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(status: u16, delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(status).set_delay(delay))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn ok_response_is_up_with_latency() {
        let server = serve(200, Duration::ZERO).await;
        let prober = HttpProber::new().unwrap();
        let result = prober
            .probe(&format!("{}/health", server.uri()), Duration::from_secs(5))
            .await;
        assert!(result.is_up());
        assert_eq!(result.status_code(), Some(200));
        assert!(result.latency().is_some());
        assert_eq!(result.error_detail(), None);
    }

    #[tokio::test]
    async fn service_unavailable_is_down_with_code() {
        let server = serve(503, Duration::ZERO).await;
        let prober = HttpProber::new().unwrap();
        let result = prober
            .probe(&format!("{}/health", server.uri()), Duration::from_secs(5))
            .await;
        assert!(!result.is_up());
        assert_eq!(result.status_code(), Some(503));
        assert!(result.latency().is_some());
    }

    #[tokio::test]
    async fn slow_response_times_out_without_code() {
        let server = serve(200, Duration::from_secs(3)).await;
        let prober = HttpProber::new().unwrap();
        let started = Instant::now();
        let result = prober
            .probe(&format!("{}/health", server.uri()), Duration::from_millis(200))
            .await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(!result.is_up());
        assert_eq!(result.status_code(), None);
        assert_eq!(result.latency(), None);
        assert_eq!(result.error_detail().as_deref(), Some("Request timeout"));
    }

    #[tokio::test]
    async fn refused_connection_is_down() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = HttpProber::new().unwrap();
        let result = prober
            .probe(&format!("http://127.0.0.1:{port}/"), Duration::from_secs(2))
            .await;
        assert!(!result.is_up());
        assert_eq!(result.status_code(), None);
        assert!(result.error_detail().is_some());
    }

    #[tokio::test]
    async fn malformed_url_is_down() {
        let prober = HttpProber::new().unwrap();
        let result = prober.probe("not a url", Duration::from_secs(1)).await;
        assert!(!result.is_up());
        assert_eq!(result.status_code(), None);
    }

    #[tokio::test]
    async fn zero_timeout_is_rejected_as_failure() {
        let prober = HttpProber::new().unwrap();
        let result = prober.probe("http://127.0.0.1:1/", Duration::ZERO).await;
        assert!(!result.is_up());
        assert!(result.error_detail().unwrap().contains("greater than zero"));
    }
}
