use super::LlmBackend;
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use cadre_core::{CadreError, CadreResult, Message};
use tracing::debug;

/// OpenAI-compatible API backend.
///
/// Works with OpenAI, OpenRouter, Groq, and any other provider that
/// implements the chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Backend for `config`, with a fresh HTTP client.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_messages(
        &self,
        system_prompt: Option<&str>,
        messages: &[Message],
    ) -> Vec<serde_json::Value> {
        let mut api_messages = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system_prompt {
            api_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }

        for m in messages {
            api_messages.push(serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content
            }));
        }

        api_messages
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter asks callers to identify themselves
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request.header("X-Title", "Cadre")
        } else {
            request
        }
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn chat(&self, system_prompt: Option<&str>, messages: &[Message]) -> CadreResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let body = serde_json::json!({
            "model": self.config.model_id,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": self.build_messages(system_prompt, messages),
        });

        debug!(model = %self.config.model_id, url = %url, "Sending chat completion request");

        let resp = self
            .add_provider_headers(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| CadreError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CadreError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(CadreError::Http(format!(
                "OpenAI API error {}: {}",
                status, resp_body
            )));
        }

        parse_openai_response(&resp_body)
    }
}

/// Extract the assistant reply from a chat completions response body.
pub fn parse_openai_response(body: &serde_json::Value) -> CadreResult<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CadreError::Http(format!("Response has no message content: {body}")))
}
