use serde::{Deserialize, Serialize};

use crate::cons::provider_cons::LLMProvider;

pub const DEFAULT_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Output cap used by the connection probe.
pub(crate) const PROBE_MAX_TOKENS: u32 = 10;
pub(crate) const PROBE_PROMPT: &str = "Hi";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl GenerationOptions {
    pub fn max_tokens_or_default(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn temperature_or_default(&self) -> f64 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub available: bool,
}

/// Contract every backend adapter satisfies.
///
/// `generate_response` never fails: auth, quota, network and decoding problems
/// come back as `"Error from <ProviderName>: <cause>"` so one backend cannot
/// abort a fan-out across the others. `validate_connection` makes a live call
/// and is meant for status reporting only.
#[allow(async_fn_in_trait)]
pub trait ProviderClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    fn model(&self) -> &str;

    async fn generate_response(&self, prompt: &str, options: &GenerationOptions) -> String;

    async fn validate_connection(&self) -> bool;

    /// `available` is a fresh probe on every call.
    async fn get_provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.provider_name().to_string(),
            model: self.model().to_string(),
            available: self.validate_connection().await,
        }
    }
}

pub(crate) fn error_from(provider: LLMProvider, cause: impl std::fmt::Display) -> String {
    format!("Error from {}: {}", provider.display_name(), cause)
}

pub(crate) fn transport_unavailable(provider: LLMProvider) -> String {
    error_from(
        provider,
        format!(
            "{} not available, install an HTTP transport for {}",
            provider.client_label(),
            provider
        ),
    )
}
