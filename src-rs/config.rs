use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cons::provider_cons::LLMProvider;
use crate::llm::models::provider_base::{GenerationOptions, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};

pub const MAX_TOKENS_VAR: &str = "MAX_TOKENS";
pub const TEMPERATURE_VAR: &str = "TEMPERATURE";
pub const REQUEST_TIMEOUT_VAR: &str = "REQUEST_TIMEOUT_MS";

/// Per-backend settings
#[derive(Clone, PartialEq)]
pub struct ProviderSettings {
    /// Credential; `None` means the provider is not configured
    pub api_key: Option<String>,

    /// Model identifier sent with every request
    pub model: String,

    /// Base URL for the backend API
    pub base_url: String,
}

impl ProviderSettings {
    pub fn defaults_for(provider: LLMProvider) -> Self {
        Self {
            api_key: None,
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Config file overlay (TOML). Every field is optional; present fields replace
/// the current value.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub request_timeout_ms: Option<u64>,
    pub claude: Option<ProviderPatch>,
    pub gemini: Option<ProviderPatch>,
    pub openai: Option<ProviderPatch>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderPatch {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Resolved settings. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub claude: ProviderSettings,
    pub gemini: ProviderSettings,
    pub openai: ProviderSettings,

    /// Output length cap passed to every backend, always positive
    pub max_tokens: u32,

    /// Sampling temperature, typically in [0, 1]; only finiteness is checked
    pub temperature: f64,

    /// Per-call timeout enforced by the orchestrator; `None` waits forever
    pub request_timeout_ms: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            claude: ProviderSettings::defaults_for(LLMProvider::Claude),
            gemini: ProviderSettings::defaults_for(LLMProvider::Gemini),
            openai: ProviderSettings::defaults_for(LLMProvider::OpenAI),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout_ms: None,
        }
    }
}

impl AppConfig {
    /// Load configuration with layered strategy:
    /// 1. Defaults
    /// 2. User Config (~/.ai-powerhouse/config.toml)
    /// 3. Project Config (./ai-powerhouse.toml)
    /// 4. Process environment
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_path = home.join(".ai-powerhouse").join("config.toml");
            config.apply_file(user_path)?;
        }

        config.apply_file(Path::new("ai-powerhouse.toml"))?;
        config.apply_lookup(|key| std::env::var(key).ok())?;

        log::info!(
            "Configuration loaded, providers configured: {:?}",
            config.validate_keys()
        );
        Ok(config)
    }

    /// Defaults overlaid with the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_lookup(lookup)?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let patch: FileConfig = toml::from_str(content).context("Failed to parse TOML config")?;
        let mut config = Self::default();
        config.apply_patch(patch)?;
        Ok(config)
    }

    /// Overlay named settings (`ANTHROPIC_API_KEY`, `MAX_TOKENS`, ...) from `lookup`.
    /// Malformed numeric values are returned as errors, never defaulted.
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in LLMProvider::ALL {
            let settings = self.provider_mut(provider);
            if let Some(api_key) = non_blank(lookup(provider.api_key_var())) {
                settings.api_key = Some(api_key);
            }
            if let Some(model) = non_blank(lookup(provider.model_var())) {
                settings.model = model;
            }
            if let Some(base_url) = non_blank(lookup(provider.base_url_var())) {
                settings.base_url = base_url;
            }
        }

        if let Some(raw) = lookup(MAX_TOKENS_VAR) {
            self.max_tokens = parse_max_tokens(&raw)?;
        }
        if let Some(raw) = lookup(TEMPERATURE_VAR) {
            self.temperature = parse_temperature(&raw)?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            self.request_timeout_ms = parse_timeout_ms(&raw)?;
        }
        Ok(())
    }

    /// Missing files are skipped; unreadable or malformed ones are errors.
    pub fn apply_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let patch: FileConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::debug!("Applying config file {}", path.display());
        self.apply_patch(patch)
    }

    pub fn apply_patch(&mut self, patch: FileConfig) -> Result<()> {
        if let Some(max_tokens) = patch.max_tokens {
            anyhow::ensure!(max_tokens > 0, "max_tokens must be a positive integer");
            self.max_tokens = max_tokens;
        }
        if let Some(temperature) = patch.temperature {
            anyhow::ensure!(temperature.is_finite(), "temperature must be a finite number");
            self.temperature = temperature;
        }
        if let Some(timeout_ms) = patch.request_timeout_ms {
            self.request_timeout_ms = (timeout_ms > 0).then_some(timeout_ms);
        }

        for (provider, provider_patch) in [
            (LLMProvider::Claude, patch.claude),
            (LLMProvider::Gemini, patch.gemini),
            (LLMProvider::OpenAI, patch.openai),
        ] {
            let Some(p) = provider_patch else {
                continue;
            };
            let settings = self.provider_mut(provider);
            if let Some(api_key) = non_blank(p.api_key) {
                settings.api_key = Some(api_key);
            }
            if let Some(model) = non_blank(p.model) {
                settings.model = model;
            }
            if let Some(base_url) = non_blank(p.base_url) {
                settings.base_url = base_url;
            }
        }
        Ok(())
    }

    pub fn provider(&self, provider: LLMProvider) -> &ProviderSettings {
        match provider {
            LLMProvider::Claude => &self.claude,
            LLMProvider::Gemini => &self.gemini,
            LLMProvider::OpenAI => &self.openai,
        }
    }

    fn provider_mut(&mut self, provider: LLMProvider) -> &mut ProviderSettings {
        match provider {
            LLMProvider::Claude => &mut self.claude,
            LLMProvider::Gemini => &mut self.gemini,
            LLMProvider::OpenAI => &mut self.openai,
        }
    }

    pub fn is_configured(&self, provider: LLMProvider) -> bool {
        self.provider(provider).api_key.is_some()
    }

    /// Which providers have a credential, keyed by registry name.
    pub fn validate_keys(&self) -> BTreeMap<String, bool> {
        LLMProvider::ALL
            .into_iter()
            .map(|p| (p.provider_name().to_string(), self.is_configured(p)))
            .collect()
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Load `.env` from the working directory or a parent. A missing file is fine,
/// an unreadable or malformed one is a startup error.
pub fn load_dotenv() -> Result<()> {
    tolerate_missing_dotenv(dotenvy::dotenv())
}

pub(crate) fn tolerate_missing_dotenv<T>(result: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e).context("Failed to load .env file"),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let v = v.trim().to_string();
        if v.is_empty() { None } else { Some(v) }
    })
}

pub(crate) fn parse_max_tokens(raw: &str) -> Result<u32> {
    let value: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value {:?}: expected a positive integer", MAX_TOKENS_VAR, raw))?;
    anyhow::ensure!(
        value > 0,
        "Invalid {} value {:?}: expected a positive integer",
        MAX_TOKENS_VAR,
        raw
    );
    Ok(value)
}

pub(crate) fn parse_temperature(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value {:?}: expected a number", TEMPERATURE_VAR, raw))?;
    anyhow::ensure!(
        value.is_finite(),
        "Invalid {} value {:?}: expected a finite number",
        TEMPERATURE_VAR,
        raw
    );
    if !(0.0..=1.0).contains(&value) {
        log::warn!("{} {} is outside the usual [0, 1] range", TEMPERATURE_VAR, value);
    }
    Ok(value)
}

/// `0` disables the timeout.
pub(crate) fn parse_timeout_ms(raw: &str) -> Result<Option<u64>> {
    let value: u64 = raw.trim().parse().with_context(|| {
        format!(
            "Invalid {} value {:?}: expected milliseconds as an integer",
            REQUEST_TIMEOUT_VAR, raw
        )
    })?;
    Ok((value > 0).then_some(value))
}
