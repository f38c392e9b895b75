//! The pluggable send operation and connectivity check.

use crate::{OutboxError, OutboxResult, RequestMethod, TrackingRequest};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Performs one delivery attempt.
///
/// `Ok(())` means the collector accepted the request. Any error is treated
/// as transient and the request is retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &TrackingRequest) -> OutboxResult<()>;
}

/// Reports whether sending is worth attempting right now.
pub trait ConnectivityProbe: Send + Sync {
    fn is_internet_available(&self) -> bool;
}

/// Probe that always reports connectivity.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_internet_available(&self) -> bool {
        true
    }
}

impl<F> ConnectivityProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_internet_available(&self) -> bool {
        self()
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User-Agent header value.
    pub user_agent: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

/// Sends tracking requests over HTTP(S). Any 2xx status is success.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    user_agent: Option<String>,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> OutboxResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            user_agent: config.user_agent,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &TrackingRequest) -> OutboxResult<()> {
        let mut builder = match request.method {
            RequestMethod::Get => self.client.get(request.url.clone()),
            RequestMethod::Post => self
                .client
                .post(request.url.clone())
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(request.body.clone().unwrap_or_default()),
        };
        if let Some(user_agent) = &self.user_agent {
            builder = builder.header(USER_AGENT, user_agent);
        }

        debug!(method = ?request.method, url = %request.url, "Sending tracking request");

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutboxError::Status {
                status: status.as_u16(),
                url: request.url.to_string(),
            });
        }

        Ok(())
    }
}
