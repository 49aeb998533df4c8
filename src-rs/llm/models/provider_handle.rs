use crate::config::ProviderSettings;
use crate::cons::provider_cons::LLMProvider;

use super::claude::ClaudeClient;
use super::gemini::GeminiClient;
use super::openai::OpenAiClient;
pub use super::provider_base::{GenerationOptions, ProviderClient, ProviderInfo};
use super::transport::TransportFactory;

pub enum AnyProviderClient {
    Claude(ClaudeClient),
    Gemini(GeminiClient),
    OpenAI(OpenAiClient),
}

impl AnyProviderClient {
    pub fn kind(&self) -> LLMProvider {
        match self {
            AnyProviderClient::Claude(_) => LLMProvider::Claude,
            AnyProviderClient::Gemini(_) => LLMProvider::Gemini,
            AnyProviderClient::OpenAI(_) => LLMProvider::OpenAI,
        }
    }

    pub fn has_transport(&self) -> bool {
        match self {
            AnyProviderClient::Claude(c) => c.has_transport(),
            AnyProviderClient::Gemini(c) => c.has_transport(),
            AnyProviderClient::OpenAI(c) => c.has_transport(),
        }
    }
}

impl ProviderClient for AnyProviderClient {
    fn provider_name(&self) -> &'static str {
        match self {
            AnyProviderClient::Claude(c) => c.provider_name(),
            AnyProviderClient::Gemini(c) => c.provider_name(),
            AnyProviderClient::OpenAI(c) => c.provider_name(),
        }
    }

    fn model(&self) -> &str {
        match self {
            AnyProviderClient::Claude(c) => c.model(),
            AnyProviderClient::Gemini(c) => c.model(),
            AnyProviderClient::OpenAI(c) => c.model(),
        }
    }

    async fn generate_response(&self, prompt: &str, options: &GenerationOptions) -> String {
        match self {
            AnyProviderClient::Claude(c) => c.generate_response(prompt, options).await,
            AnyProviderClient::Gemini(c) => c.generate_response(prompt, options).await,
            AnyProviderClient::OpenAI(c) => c.generate_response(prompt, options).await,
        }
    }

    async fn validate_connection(&self) -> bool {
        match self {
            AnyProviderClient::Claude(c) => c.validate_connection().await,
            AnyProviderClient::Gemini(c) => c.validate_connection().await,
            AnyProviderClient::OpenAI(c) => c.validate_connection().await,
        }
    }
}

/// Builds the adapter for `provider`, or `None` when it has no credential.
pub fn create_client(
    provider: LLMProvider,
    settings: &ProviderSettings,
    transports: &dyn TransportFactory,
) -> Option<AnyProviderClient> {
    let api_key = settings.api_key.clone()?;
    let base_url = settings.base_url.clone();
    let model_name = settings.model.clone();
    let transport = transports.create(provider);

    let client = match provider {
        LLMProvider::Claude => {
            AnyProviderClient::Claude(ClaudeClient::new(base_url, api_key, model_name, transport))
        }
        LLMProvider::Gemini => {
            AnyProviderClient::Gemini(GeminiClient::new(base_url, api_key, model_name, transport))
        }
        LLMProvider::OpenAI => {
            AnyProviderClient::OpenAI(OpenAiClient::new(base_url, api_key, model_name, transport))
        }
    };
    Some(client)
}
