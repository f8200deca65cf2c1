use async_trait::async_trait;
use cadre_core::{CadreError, CadreResult, Invocation};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// A single invocable operation exposed by an agent.
///
/// Implemented by closures (via [`FnCapability`] / [`AsyncFnCapability`]),
/// stateful objects, or remote stubs alike. Every capability receives the
/// input payload first, even if it ignores it.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Run the capability.
    async fn invoke(&self, call: Invocation) -> CadreResult<Value>;
}

/// Adapts a synchronous closure into a [`Capability`].
///
/// The closure runs on tokio's blocking pool, so a stalled body cannot hold
/// up other tasks and a dispatch timeout still fires. A timed-out body keeps
/// running in the background until it returns.
pub struct FnCapability<F>(Arc<F>);

impl<F> FnCapability<F>
where
    F: Fn(Invocation) -> CadreResult<Value> + Send + Sync + 'static,
{
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[async_trait]
impl<F> Capability for FnCapability<F>
where
    F: Fn(Invocation) -> CadreResult<Value> + Send + Sync + 'static,
{
    async fn invoke(&self, call: Invocation) -> CadreResult<Value> {
        let f = Arc::clone(&self.0);
        match tokio::task::spawn_blocking(move || f(call)).await {
            Ok(result) => result,
            // Re-raise so the caller's unwind guard reports the original message.
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(CadreError::Capability(format!("Capability task aborted: {e}"))),
        }
    }
}

/// Adapts a closure returning a future into a [`Capability`].
pub struct AsyncFnCapability<F>(F);

impl<F, Fut> AsyncFnCapability<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = CadreResult<Value>> + Send,
{
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Capability for AsyncFnCapability<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = CadreResult<Value>> + Send,
{
    async fn invoke(&self, call: Invocation) -> CadreResult<Value> {
        (self.0)(call).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn test_fn_capability_receives_input() {
        let cap = FnCapability::new(|call: Invocation| Ok(json!({ "echo": call.input })));
        let out = cap.invoke(Invocation::new("hi")).await.unwrap();
        assert_eq!(out, json!({"echo": "hi"}));
    }

    #[tokio::test]
    async fn test_async_fn_capability() {
        let cap = AsyncFnCapability::new(|call: Invocation| async move {
            tokio::task::yield_now().await;
            let x = call.kwarg("x").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!({ "double": x * 2 }))
        });
        let out = cap
            .invoke(Invocation::default().with_kwarg("x", 21))
            .await
            .unwrap();
        assert_eq!(out, json!({"double": 42}));
    }

    #[tokio::test]
    async fn test_fn_capability_error_passes_through() {
        let cap = FnCapability::new(|_| Err(CadreError::Capability("nope".into())));
        let err = cap.invoke(Invocation::default()).await.unwrap_err();
        assert!(matches!(err, CadreError::Capability(_)));
    }

    #[tokio::test]
    async fn test_fn_capability_runs_off_the_async_thread() {
        let cap = FnCapability::new(|_| {
            std::thread::sleep(Duration::from_millis(300));
            Ok(json!("done"))
        });
        let started = Instant::now();
        let outcome =
            tokio::time::timeout(Duration::from_millis(20), cap.invoke(Invocation::default()))
                .await;
        assert!(outcome.is_err());
        assert!(started.elapsed() < Duration::from_millis(250));
    }
}
