use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::{
    error_from, transport_unavailable, GenerationOptions, ProviderClient, PROBE_MAX_TOKENS,
    PROBE_PROMPT,
};
use crate::llm::models::transport::{HttpRequest, HttpTransport};

pub(crate) fn build_chat_completions_request(
    api_base: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    max_tokens: u32,
    temperature: Option<f64>,
) -> HttpRequest {
    let url = format!("{}/chat/completions", api_base.trim_end_matches('/'));

    let mut request_body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": [
            { "role": "user", "content": prompt }
        ],
        "stream": false,
    });
    if let Some(temperature) = temperature {
        request_body["temperature"] = json!(temperature);
    }

    HttpRequest::new(url, request_body).header("Authorization", format!("Bearer {}", api_key))
}

/// `None` when the first choice carries no content (null or missing).
pub(crate) fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|c| c.to_string())
}

pub struct OpenAiClient {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl OpenAiClient {
    pub fn new(
        api_base: String,
        api_key: String,
        model: String,
        transport: Option<Arc<dyn HttpTransport>>,
    ) -> Self {
        Self {
            api_base,
            api_key,
            model,
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
        let request = build_chat_completions_request(
            &self.api_base,
            &self.api_key,
            &self.model,
            prompt,
            max_tokens,
            temperature,
        );
        let body = transport.post_json(request).await?;
        log::debug!("OpenAI response: {}", body);
        extract_text(&body).ok_or_else(|| anyhow::anyhow!("response did not contain message content"))
    }
}

impl ProviderClient for OpenAiClient {
    fn provider_name(&self) -> &'static str {
        LLMProvider::OpenAI.display_name()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_response(&self, prompt: &str, options: &GenerationOptions) -> String {
        let Some(transport) = self.transport.as_deref() else {
            return transport_unavailable(LLMProvider::OpenAI);
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
                log::warn!("OpenAI request failed: {:#}", e);
                error_from(LLMProvider::OpenAI, format!("{:#}", e))
            }
        }
    }

    async fn validate_connection(&self) -> bool {
        let Some(transport) = self.transport.as_deref() else {
            return false;
        };
        self.send(transport, PROBE_PROMPT, PROBE_MAX_TOKENS, None)
            .await
            .is_ok()
    }
}
