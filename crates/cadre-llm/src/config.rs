use serde::{Deserialize, Serialize};

/// Which hosted API a [`ModelConfig`] targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// api.openai.com
    OpenAi,
    /// OpenRouter's OpenAI-compatible gateway.
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    Groq,
}

/// Model selection and sampling settings, the `[model]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend to talk to.
    pub provider: LlmProvider,
    /// Provider-specific model name, e.g. `gpt-4o-mini`.
    pub model_id: String,
    /// May be left empty in the config file and filled from the environment.
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's default endpoint.
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion length limit.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    256
}

impl ModelConfig {
    /// Config with no key, the default endpoint and default sampling.
    pub fn new(provider: LlmProvider, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }

    /// `api_base_url` if set, otherwise the provider's public endpoint.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
            }
        }
    }
}
