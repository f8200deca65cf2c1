//! Language-model collaborators for Cadre.
//!
//! Provides the chat backend used to talk to OpenAI-compatible endpoints,
//! a positional prompt template, and [`LlmDecomposer`], the
//! [`cadre_core::Decomposer`] that asks a model to break an objective into
//! tasks.

pub mod backends;
pub mod config;
pub mod decomposer;
pub mod llm;
pub mod template;

pub use config::{LlmProvider, ModelConfig};
pub use decomposer::{extract_task_records, LlmDecomposer, DECOMPOSE_TEMPLATE};
pub use llm::LlmClient;
pub use template::PromptTemplate;
