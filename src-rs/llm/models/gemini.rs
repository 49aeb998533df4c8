use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::{
    error_from, transport_unavailable, GenerationOptions, ProviderClient, PROBE_MAX_TOKENS,
    PROBE_PROMPT,
};
use crate::llm::models::transport::{HttpRequest, HttpTransport};

pub(crate) fn build_generate_content_request(
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    max_output_tokens: u32,
    temperature: Option<f64>,
) -> HttpRequest {
    let url = format!(
        "{}/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    );

    let mut generation_config = json!({ "maxOutputTokens": max_output_tokens });
    if let Some(temperature) = temperature {
        generation_config["temperature"] = json!(temperature);
    }

    let request_body = json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": generation_config
    });

    // key stays out of the URL, transport errors echo it
    HttpRequest::new(url, request_body).header("x-goog-api-key", api_key)
}

pub(crate) fn extract_text(body: &Value) -> Option<String> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
}

pub struct GeminiClient {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl GeminiClient {
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
        max_output_tokens: u32,
        temperature: Option<f64>,
    ) -> Result<String> {
        let request = build_generate_content_request(
            &self.base_url,
            &self.api_key,
            &self.model_name,
            prompt,
            max_output_tokens,
            temperature,
        );
        let body = transport.post_json(request).await?;
        log::debug!("Gemini response: {}", body);
        extract_text(&body).ok_or_else(|| anyhow::anyhow!("response did not contain any candidates"))
    }
}

impl ProviderClient for GeminiClient {
    fn provider_name(&self) -> &'static str {
        LLMProvider::Gemini.display_name()
    }

    fn model(&self) -> &str {
        &self.model_name
    }

    async fn generate_response(&self, prompt: &str, options: &GenerationOptions) -> String {
        let Some(transport) = self.transport.as_deref() else {
            return transport_unavailable(LLMProvider::Gemini);
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
                log::warn!("Gemini request failed: {:#}", e);
                error_from(LLMProvider::Gemini, format!("{:#}", e))
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
