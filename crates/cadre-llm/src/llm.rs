use crate::backends::openai::OpenAiBackend;
use crate::backends::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use cadre_core::{CadreResult, Message};

/// LLM client that dispatches to the correct provider backend.
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
}

impl LlmClient {
    /// Pick the backend for `config.provider`.
    pub fn new(config: ModelConfig) -> Self {
        let backend: Box<dyn LlmBackend> = match config.provider {
            LlmProvider::OpenAi | LlmProvider::OpenRouter | LlmProvider::Groq => {
                Box::new(OpenAiBackend::new(config))
            }
        };
        Self { backend }
    }

    /// Create from a pre-built backend (for custom providers and tests).
    pub fn from_backend(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// Non-streaming chat completion.
    pub async fn chat(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
    ) -> CadreResult<String> {
        self.backend.chat(system_prompt, messages).await
    }
}
