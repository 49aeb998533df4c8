use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::cons::provider_cons::LLMProvider;

/// One JSON POST against a backend.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HttpRequest {
    pub fn new(url: String, body: Value) -> Self {
        Self {
            url,
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }
}

/// The only capability an adapter needs from its HTTP stack: submit one request,
/// get back the decoded JSON body or an error. Non-2xx statuses are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_json(&self, request: HttpRequest) -> Result<Value>;
}

/// Decides at composition time which transport each adapter gets.
/// `None` means the backend's client is not available in this build.
pub trait TransportFactory: Send + Sync {
    fn create(&self, provider: LLMProvider) -> Option<Arc<dyn HttpTransport>>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(30));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<Value> {
        let mut builder = self
            .http_client
            .post(&request.url)
            .header("content-type", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .context("Failed to send request (possible timeout or network error)")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, error_text);
        }

        let json: Value = response
            .json()
            .await
            .context("Failed to parse response JSON")?;
        Ok(json)
    }
}

/// Builds one reqwest transport per provider.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransportFactory {
    pub timeout: Option<Duration>,
}

impl ReqwestTransportFactory {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn create(&self, provider: LLMProvider) -> Option<Arc<dyn HttpTransport>> {
        match ReqwestTransport::new(self.timeout) {
            Ok(transport) => Some(Arc::new(transport)),
            Err(e) => {
                log::warn!("HTTP transport for {} unavailable: {:#}", provider, e);
                None
            }
        }
    }
}

/// Every adapter is constructed without a transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableTransportFactory;

impl TransportFactory for UnavailableTransportFactory {
    fn create(&self, _provider: LLMProvider) -> Option<Arc<dyn HttpTransport>> {
        None
    }
}
