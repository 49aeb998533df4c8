use serde::{Deserialize, Serialize};

/// Backends known to the powerhouse, declared in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    Claude,
    Gemini,
    OpenAI,
}

impl LLMProvider {
    pub const ALL: [LLMProvider; 3] = [LLMProvider::Claude, LLMProvider::Gemini, LLMProvider::OpenAI];

    /// Returns the registry key used by callers (e.g., "claude", "openai")
    pub fn provider_name(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "claude",
            LLMProvider::Gemini => "gemini",
            LLMProvider::OpenAI => "openai",
        }
    }

    /// Human readable identity reported by the adapter
    pub fn display_name(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "Claude",
            LLMProvider::Gemini => "Gemini",
            LLMProvider::OpenAI => "OpenAI",
        }
    }

    /// Exact match on the registry key, no aliases.
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.provider_name() == s)
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "ANTHROPIC_API_KEY",
            LLMProvider::Gemini => "GOOGLE_API_KEY",
            LLMProvider::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn model_var(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "CLAUDE_MODEL",
            LLMProvider::Gemini => "GEMINI_MODEL",
            LLMProvider::OpenAI => "OPENAI_MODEL",
        }
    }

    pub fn base_url_var(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "ANTHROPIC_BASE_URL",
            LLMProvider::Gemini => "GEMINI_BASE_URL",
            LLMProvider::OpenAI => "OPENAI_BASE_URL",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "claude-3-sonnet-20240229",
            LLMProvider::Gemini => "gemini-pro",
            LLMProvider::OpenAI => "gpt-4",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "https://api.anthropic.com",
            LLMProvider::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            LLMProvider::OpenAI => "https://api.openai.com/v1",
        }
    }

    /// Name of the vendor client used in "not available" messages
    pub fn client_label(&self) -> &'static str {
        match self {
            LLMProvider::Claude => "Anthropic client",
            LLMProvider::Gemini => "Google GenerativeAI client",
            LLMProvider::OpenAI => "OpenAI client",
        }
    }
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.provider_name())
    }
}
