#![allow(clippy::unwrap_used, clippy::expect_used)]

use cadre_agents::{AgentManager, Capability, DynamicAgent};
use cadre_core::{CadreResult, DispatchErrorKind, DispatchResult, Invocation};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn calc_agent() -> DynamicAgent {
    DynamicAgent::builder("Calc", "Arithmetic helper")
        .capability_fn("add", |call| {
            let x = call.kwarg("x").and_then(Value::as_i64).unwrap_or(0);
            let y = call.kwarg("y").and_then(Value::as_i64).unwrap_or(0);
            Ok(json!({ "result": x + y }))
        })
        .capability_fn("echo", |call| Ok(call.input))
        .build()
        .unwrap()
}

// ---------------------------------------------------------------------------
// 1. Calc scenario: dispatch("Calc", "add", None, x=2, y=3) -> {result: 5}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn calc_add_returns_sum() {
    let manager = AgentManager::new();
    manager.register(calc_agent());

    let call = Invocation::default().with_kwarg("x", 2).with_kwarg("y", 3);
    let result = manager.dispatch("Calc", "add", call).await;

    assert_eq!(result, DispatchResult::success(json!({"result": 5})));
}

// ---------------------------------------------------------------------------
// 2. Missing agents and capabilities come back as data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_agent_is_reported_not_raised() {
    let manager = AgentManager::new();
    for name in ["Ghost", "calc", ""] {
        let result = manager.dispatch(name, "noop", Invocation::default()).await;
        assert_eq!(result.error_kind(), Some(DispatchErrorKind::AgentNotFound));
    }

    let result = manager.dispatch("Ghost", "noop", Invocation::default()).await;
    assert!(result.to_value()["error"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn unknown_capability_names_agent_and_capability() {
    let manager = AgentManager::new();
    manager.register(calc_agent());

    for cap in ["sub", "ADD", "describe"] {
        let result = manager.dispatch("Calc", cap, Invocation::default()).await;
        assert_eq!(result.error_kind(), Some(DispatchErrorKind::CapabilityNotFound));
        let message = result.to_value()["error"].as_str().unwrap().to_string();
        assert!(message.contains("Calc") && message.contains(cap));
    }
}

// ---------------------------------------------------------------------------
// 3. Pass-through: the payload comes back exactly as the capability built it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_is_a_pass_through() {
    let manager = AgentManager::new();
    manager.register(calc_agent());

    for payload in [
        json!(null),
        json!("plain"),
        json!([1, 2, 3]),
        json!({"nested": {"success": false, "items": []}}),
    ] {
        let result = manager
            .dispatch("Calc", "echo", Invocation::new(payload.clone()))
            .await;
        assert_eq!(result.payload(), Some(&payload));
    }
}

// ---------------------------------------------------------------------------
// 4. Object capabilities and concurrent dispatch
// ---------------------------------------------------------------------------

struct Counter {
    hits: AtomicUsize,
}

#[async_trait]
impl Capability for Counter {
    async fn invoke(&self, _call: Invocation) -> CadreResult<Value> {
        let n = self.hits.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::task::yield_now().await;
        Ok(json!({ "count": n }))
    }
}

#[tokio::test]
async fn object_capability_shared_across_concurrent_dispatches() {
    let counter = Arc::new(Counter {
        hits: AtomicUsize::new(0),
    });
    let manager = Arc::new(AgentManager::new());
    manager.register(
        DynamicAgent::builder("Stats", "Counts calls")
            .input_type("none")
            .capability("tick", counter.clone())
            .build()
            .unwrap(),
    );

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager.dispatch("Stats", "tick", Invocation::default()).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_success());
    }
    assert_eq!(counter.hits.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn registration_during_dispatch_traffic() {
    let manager = Arc::new(AgentManager::new());
    manager.register(calc_agent());

    let reader = {
        let manager = manager.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                let result = manager.dispatch("Late", "ping", Invocation::default()).await;
                assert!(
                    result.is_success()
                        || result.error_kind() == Some(DispatchErrorKind::AgentNotFound)
                );
                tokio::task::yield_now().await;
            }
        })
    };

    manager.register(
        DynamicAgent::builder("Late", "Registered mid-flight")
            .capability_fn("ping", |_| Ok(json!("pong")))
            .build()
            .unwrap(),
    );
    reader.await.unwrap();

    let result = manager.dispatch("Late", "ping", Invocation::default()).await;
    assert_eq!(result.payload(), Some(&json!("pong")));
}

// ---------------------------------------------------------------------------
// 6. A stalled synchronous capability does not hold up other dispatches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blocking_capability_does_not_stall_other_dispatches() {
    let manager = Arc::new(AgentManager::new());
    manager.register(calc_agent());
    manager.register(
        DynamicAgent::builder("Sleepy", "Blocks its thread")
            .capability_fn("nap", |_| {
                std::thread::sleep(std::time::Duration::from_millis(500));
                Ok(json!("rested"))
            })
            .build()
            .unwrap(),
    );

    let started = std::time::Instant::now();
    let napping = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.dispatch("Sleepy", "nap", Invocation::default()).await })
    };
    tokio::task::yield_now().await;

    let call = Invocation::default().with_kwarg("x", 1).with_kwarg("y", 1);
    let sum = manager.dispatch("Calc", "add", call).await;
    assert_eq!(sum.field("result"), Some(&json!(2)));
    assert!(started.elapsed() < std::time::Duration::from_millis(400));

    assert_eq!(napping.await.unwrap().payload(), Some(&json!("rested")));
}
