use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::{
    error_from, transport_unavailable, GenerationOptions, ProviderClient, PROBE_MAX_TOKENS,
    PROBE_PROMPT,
};
use crate::llm::models::transport::{HttpRequest, HttpTransport};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) fn build_messages_request(
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    max_tokens: u32,
    temperature: Option<f64>,
) -> HttpRequest {
    let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));

    let mut request_body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [
            { "role": "user", "content": prompt }
        ]
    });
    if let Some(temperature) = temperature {
        request_body["temperature"] = json!(temperature);
    }

    HttpRequest::new(url, request_body)
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
}

pub(crate) fn extract_text(body: &Value) -> Option<String> {
    body.get("content")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|block| block.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
}

pub struct ClaudeClient {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl ClaudeClient {
    pub fn new(
        base_url: String,
        api_key: String,
        model_name: String,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Self {
        Self {
            base_url,
            api_key,
            model_name,
            transport,
        }
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    async fn send(
        &self,
        transport: &dyn HttpTransport,
        prompt: &str,
        max_tokens: u32,
        temperature: Option<f64>,
    ) -> Result<String> {
        let request = build_messages_request(
            &self.base_url,
            &self.api_key,
            &self.model_name,
            prompt,
            max_tokens,
            temperature,
        );
        let body = transport.post_json(request).await?;
        log::debug!("Claude response: {}", body);
        extract_text(&body).ok_or_else(|| anyhow::anyhow!("response did not contain any text content"))
    }
}

impl ProviderClient for ClaudeClient {
    fn provider_name(&self) -> &'static str {
        LLMProvider::Claude.display_name()
    }

    fn model(&self) -> &str {
        &self.model_name
    }

    async fn generate_response(&self, prompt: &str, options: &GenerationOptions) -> String {
        let Some(transport) = self.transport.as_deref() else {
            return transport_unavailable(LLMProvider::Claude);
        };

        match self
            .send(
                transport,
                prompt,
                options.max_tokens_or_default(),
                Some(options.temperature_or_default()),
            )
            .await
        {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Claude request failed: {:#}", e);
                error_from(LLMProvider::Claude, format!("{:#}", e))
            }
        }
    }

    async fn validate_connection(&self) -> bool {
        let Some(transport) = self.transport.as_deref() else {
            return false;
        };
        let request = build_messages_request(
            &self.base_url,
            &self.api_key,
            &self.model_name,
            PROBE_PROMPT,
            PROBE_MAX_TOKENS,
            None,
        );
        // any 2xx counts, even without text
        transport.post_json(request).await.is_ok()
    }
}
