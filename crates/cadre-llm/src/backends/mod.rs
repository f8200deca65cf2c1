/// OpenAI-compatible chat completions backend.
pub mod openai;

use async_trait::async_trait;
use cadre_core::{CadreResult, Message};

/// Trait for LLM provider backends.
///
/// To add a provider, implement this trait in `backends/`, add the variant to
/// [`crate::LlmProvider`] and wire it up in [`crate::LlmClient::new`].
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Non-streaming chat completion returning the reply text.
    async fn chat(&self, system_prompt: Option<&str>, messages: &[Message]) -> CadreResult<String>;
}
