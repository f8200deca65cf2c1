//! Built-in demonstration agents registered by the `cadre` binary.

use cadre_agents::{AgentManager, DynamicAgent};
use cadre_core::{CadreError, CadreResult, Invocation};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Register `Calc`, `Greeter` and `Counter` with `manager`.
pub fn register_demo_agents(manager: &AgentManager) -> CadreResult<()> {
    manager.register(calc()?);
    manager.register(greeter()?);
    manager.register(counter()?);
    Ok(())
}

fn calc() -> CadreResult<DynamicAgent> {
    DynamicAgent::builder("Calc", "Performs arithmetic on two numbers")
        .input_type("[x, y] or {\"x\": .., \"y\": ..}")
        .capability_fn("add", |call| {
            let (x, y) = operands(&call)?;
            Ok(answer(x + y))
        })
        .capability_fn("multiply", |call| {
            let (x, y) = operands(&call)?;
            Ok(answer(x * y))
        })
        .capability_fn("add_and_multiply", |call| {
            let (x, y) = operands(&call)?;
            Ok(answer((x + y) * 2.0))
        })
        .build()
}

fn greeter() -> CadreResult<DynamicAgent> {
    DynamicAgent::builder("Greeter", "Says hello and goodbye")
        .input_type("none")
        .capability_fn("complex_hello", |_| {
            Ok(json!({"result": "Hello, this is complex!", "success": true}))
        })
        .capability_fn("say_goodbye", |_| {
            Ok(json!({"result": "Goodbye!", "success": true}))
        })
        .build()
}

fn counter() -> CadreResult<DynamicAgent> {
    let count = Arc::new(AtomicU64::new(0));
    DynamicAgent::builder("Counter", "Counts how often it is asked")
        .input_type("none")
        .capability_fn("tick", move |_| {
            let n = count.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(json!({"count": n}))
        })
        .build()
}

fn answer(n: f64) -> Value {
    let result = if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    };
    json!({"result": result, "success": true})
}

/// Two numbers from keyword arguments `x`/`y`, an `[x, y]` input, an
/// `{"x", "y"}` input, or the first two positional arguments.
fn operands(call: &Invocation) -> CadreResult<(f64, f64)> {
    let pair = |a: Option<&Value>, b: Option<&Value>| match (a, b) {
        (Some(a), Some(b)) => a.as_f64().zip(b.as_f64()),
        _ => None,
    };

    pair(call.kwarg("x"), call.kwarg("y"))
        .or_else(|| match &call.input {
            Value::Array(items) => pair(items.first(), items.get(1)),
            Value::Object(map) => pair(map.get("x"), map.get("y")),
            _ => None,
        })
        .or_else(|| pair(call.arg(0), call.arg(1)))
        .ok_or_else(|| CadreError::Capability("Expected two numbers".into()))
}
