use async_trait::async_trait;
use cadre_core::DispatchResult;

/// Decides whether an unsuccessful step should trigger re-decomposition.
///
/// Returning `Some(objective)` asks the engine to decompose `objective` again
/// and append the new tasks to its queue. The engine caps how often this can
/// happen per run, so a policy may answer `Some` unconditionally.
#[async_trait]
pub trait ReassessPolicy: Send + Sync {
    /// Inspect an unsuccessful result for `objective`.
    async fn reassess(&self, result: &DispatchResult, objective: &str) -> Option<String>;
}

/// Failed tasks are dropped; nothing is re-planned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRedecompose;

#[async_trait]
impl ReassessPolicy for NeverRedecompose {
    async fn reassess(&self, _result: &DispatchResult, _objective: &str) -> Option<String> {
        None
    }
}

/// Re-plans the original objective whenever dispatch itself failed.
///
/// Results that ran but did not report success are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedecomposeOnFailure;

#[async_trait]
impl ReassessPolicy for RedecomposeOnFailure {
    async fn reassess(&self, result: &DispatchResult, objective: &str) -> Option<String> {
        result.is_error().then(|| objective.to_string())
    }
}
