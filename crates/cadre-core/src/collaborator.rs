//! Narrow interfaces to the language model and conversation memory.
//!
//! These traits live in `cadre-core` so that the orchestrator (which consumes
//! them) and `cadre-llm` / `cadre-memory` (which implement them) can share
//! them without depending on each other.

use crate::CadreResult;
use async_trait::async_trait;

/// Turns an objective into a sequence of task-shaped records.
///
/// Records are returned raw; the caller normalizes them and skips any that
/// lack required fields. Retries and timeouts at the LLM boundary are the
/// implementation's concern.
#[async_trait]
pub trait Decomposer: Send + Sync {
    /// Decompose `objective` given an assembled `context` string.
    async fn decompose(&self, objective: &str, context: &str)
        -> CadreResult<Vec<serde_json::Value>>;
}

/// Read-only view over conversation memory.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Up to `n` recent buffered turns, most recent first.
    async fn recent_context(&self, n: usize) -> Vec<String>;

    /// Look up a stored memory entry by key.
    async fn lookup(&self, key: &str) -> CadreResult<Option<String>>;
}

/// A [`ContextSource`] with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

#[async_trait]
impl ContextSource for NoContext {
    async fn recent_context(&self, _n: usize) -> Vec<String> {
        Vec::new()
    }

    async fn lookup(&self, _key: &str) -> CadreResult<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_context_is_empty() {
        let ctx = NoContext;
        assert!(ctx.recent_context(5).await.is_empty());
        assert!(ctx.lookup("anything").await.unwrap().is_none());
    }
}
