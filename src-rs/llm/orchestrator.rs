//! Fan-out of one prompt to every configured backend.
//!
//! The registry is filled once in priority order and never changes afterwards.
//! `ask` starts every targeted call before awaiting any of them and only returns
//! once all have settled; a failing or stuck backend shows up as an entry in the
//! result map, never as a missing key.

use anyhow::{anyhow, Result};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use crate::config::AppConfig;
use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_handle::{
    create_client, AnyProviderClient, GenerationOptions, ProviderClient, ProviderInfo,
};
use crate::llm::models::transport::{ReqwestTransportFactory, TransportFactory};

pub const NO_PROVIDERS_KEY: &str = "error";
pub const NO_PROVIDERS_MESSAGE: &str = "No valid providers available";

pub struct AiPowerhouse {
    config: AppConfig,
    providers: BTreeMap<LLMProvider, AnyProviderClient>,
}

impl AiPowerhouse {
    /// Registry backed by real HTTP transports, timed out per `config.request_timeout()`.
    pub fn new(config: AppConfig) -> Self {
        let transports = ReqwestTransportFactory::new(config.request_timeout());
        Self::with_transports(config, &transports)
    }

    /// Layered config (files + environment), then [`AiPowerhouse::new`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(AppConfig::load()?))
    }

    pub fn with_transports(config: AppConfig, transports: &dyn TransportFactory) -> Self {
        let mut providers = BTreeMap::new();
        for provider in LLMProvider::ALL {
            match create_client(provider, config.provider(provider), transports) {
                Some(client) => {
                    if !client.has_transport() {
                        log::warn!(
                            "{} registered without a transport; requests will report it unavailable",
                            client.provider_name()
                        );
                    }
                    log::info!("Registered provider {} (model {})", provider, client.model());
                    providers.insert(client.kind(), client);
                }
                None => log::debug!("Provider {} has no credential, skipping", provider),
            }
        }

        if providers.is_empty() {
            log::warn!("No AI providers configured");
        }

        Self { config, providers }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Ask every registered provider, or only those named in `providers`.
    /// Unknown names are ignored.
    pub async fn ask(&self, prompt: &str, providers: Option<&[&str]>) -> BTreeMap<String, String> {
        let targets: Vec<(LLMProvider, &AnyProviderClient)> = self
            .providers
            .iter()
            .filter(|(p, _)| providers.map_or(true, |names| names.contains(&p.provider_name())))
            .map(|(p, client)| (*p, client))
            .collect();

        if targets.is_empty() {
            log::warn!("Ask requested with no usable providers: {:?}", providers);
            return BTreeMap::from([(
                NO_PROVIDERS_KEY.to_string(),
                NO_PROVIDERS_MESSAGE.to_string(),
            )]);
        }

        let options = self.config.generation_options();
        log::info!(
            "Dispatching prompt ({} chars) to {:?}",
            prompt.len(),
            targets.iter().map(|(p, _)| p.provider_name()).collect::<Vec<_>>()
        );

        let calls = targets
            .iter()
            .map(|(_, client)| self.dispatch(client, prompt, &options));
        let results = join_all(calls).await;

        targets
            .into_iter()
            .zip(results)
            .map(|((provider, _), text)| (provider.provider_name().to_string(), text))
            .collect()
    }

    /// Single provider by registry name; unregistered names get
    /// `"<name> provider not available"` without any call.
    pub async fn ask_single(&self, provider_name: &str, prompt: &str) -> String {
        let client = LLMProvider::from_name(provider_name).and_then(|p| self.providers.get(&p));
        match client {
            Some(client) => {
                self.dispatch(client, prompt, &self.config.generation_options())
                    .await
            }
            None => format!("{} provider not available", provider_name),
        }
    }

    pub async fn ask_provider(&self, provider: LLMProvider, prompt: &str) -> String {
        match self.providers.get(&provider) {
            Some(client) => {
                self.dispatch(client, prompt, &self.config.generation_options())
                    .await
            }
            None => format!("{} provider not available", provider.display_name()),
        }
    }

    pub async fn ask_claude(&self, prompt: &str) -> String {
        self.ask_provider(LLMProvider::Claude, prompt).await
    }

    pub async fn ask_gemini(&self, prompt: &str) -> String {
        self.ask_provider(LLMProvider::Gemini, prompt).await
    }

    pub async fn ask_openai(&self, prompt: &str) -> String {
        self.ask_provider(LLMProvider::OpenAI, prompt).await
    }

    /// Registered names in priority order.
    pub fn get_available_providers(&self) -> Vec<String> {
        self.providers
            .keys()
            .map(|p| p.provider_name().to_string())
            .collect()
    }

    /// Live probe of every registered backend. Slow; not for hot paths.
    /// A probe that times out or panics reports `available: false`.
    pub async fn get_provider_info(&self) -> BTreeMap<String, ProviderInfo> {
        let probes = self.providers.values().map(|client| self.guarded_probe(client));
        let infos = join_all(probes).await;

        self.providers
            .keys()
            .zip(infos)
            .map(|(provider, info)| (provider.provider_name().to_string(), info))
            .collect()
    }

    async fn dispatch(
        &self,
        client: &AnyProviderClient,
        prompt: &str,
        options: &GenerationOptions,
    ) -> String {
        match self.guarded_generate(client, prompt, options).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("{} call failed unexpectedly: {:#}", client.provider_name(), e);
                format!("Error: {:#}", e)
            }
        }
    }

    async fn guarded_probe(&self, client: &AnyProviderClient) -> ProviderInfo {
        let probe = AssertUnwindSafe(client.validate_connection()).catch_unwind();

        let outcome = match self.config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, probe).await.unwrap_or_else(|_| {
                log::warn!(
                    "{} probe did not respond within {} ms",
                    client.provider_name(),
                    limit.as_millis()
                );
                Ok(false)
            }),
            None => probe.await,
        };

        let available = outcome.unwrap_or_else(|payload| {
            log::error!(
                "{} probe panicked: {}",
                client.provider_name(),
                panic_message(payload.as_ref())
            );
            false
        });

        ProviderInfo {
            name: client.provider_name().to_string(),
            model: client.model().to_string(),
            available,
        }
    }

    /// Adapters report ordinary failures as text. What is left here is a panic
    /// inside the adapter or the per-call timeout running out.
    async fn guarded_generate(
        &self,
        client: &AnyProviderClient,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        let call = AssertUnwindSafe(client.generate_response(prompt, options)).catch_unwind();

        let outcome = match self.config.request_timeout() {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                anyhow!(
                    "{} did not respond within {} ms",
                    client.provider_name(),
                    limit.as_millis()
                )
            })?,
            None => call.await,
        };

        outcome.map_err(|payload| {
            anyhow!(
                "{} adapter panicked: {}",
                client.provider_name(),
                panic_message(payload.as_ref())
            )
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
