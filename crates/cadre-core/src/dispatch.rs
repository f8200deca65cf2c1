use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments for a single capability call.
///
/// `input` is always passed first; capabilities that need no input receive
/// `Value::Null` and must ignore it. Positional `args` and keyword `kwargs`
/// follow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    /// Primary input payload.
    #[serde(default)]
    pub input: Value,
    /// Extra positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Extra keyword arguments.
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

impl Invocation {
    /// Create an invocation carrying only an input payload.
    pub fn new(input: impl Into<Value>) -> Self {
        Self {
            input: input.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set a keyword argument, replacing any previous value under `key`.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Replace the keyword arguments wholesale.
    pub fn with_kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Look up a keyword argument.
    pub fn kwarg(&self, key: &str) -> Option<&Value> {
        self.kwargs.get(key)
    }

    /// Look up a positional argument.
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

/// Classification of a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchErrorKind {
    /// No agent is registered under the requested name.
    AgentNotFound,
    /// The agent exists but exposes no capability with the requested name.
    CapabilityNotFound,
    /// The capability returned an error or panicked.
    CapabilityFailure,
    /// The capability did not return within the configured dispatch timeout.
    Timeout,
}

impl std::fmt::Display for DispatchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchErrorKind::AgentNotFound => write!(f, "agent_not_found"),
            DispatchErrorKind::CapabilityNotFound => write!(f, "capability_not_found"),
            DispatchErrorKind::CapabilityFailure => write!(f, "capability_failure"),
            DispatchErrorKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// Structured error record returned in place of a capability payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchError {
    /// What went wrong.
    pub kind: DispatchErrorKind,
    /// Human-readable description naming the missing agent or capability.
    #[serde(rename = "error")]
    pub message: String,
}

/// The only value dispatch ever produces.
///
/// Serialized untagged: a success is the bare payload, an error is
/// `{"error": <message>, "kind": <kind>}`.
///
/// The encoding is lossy in one direction. A success payload that is an
/// object with a string `error` and a recognised `kind` reads back as
/// [`DispatchResult::Error`], and any other fields it carried are dropped.
/// Dispatch hands results over in memory, so this only matters for results
/// round-tripped through JSON; capabilities should not return that shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchResult {
    /// Structured failure. Listed first so untagged deserialization prefers it.
    Error(DispatchError),
    /// Application-defined payload, passed through unmodified.
    Success(Value),
}

impl DispatchResult {
    /// Wrap a capability payload.
    pub fn success(payload: impl Into<Value>) -> Self {
        DispatchResult::Success(payload.into())
    }

    /// Build an error result.
    pub fn error(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        DispatchResult::Error(DispatchError {
            kind,
            message: message.into(),
        })
    }

    /// Whether the capability ran and returned a payload.
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Success(_))
    }

    /// Whether dispatch produced an error record.
    pub fn is_error(&self) -> bool {
        matches!(self, DispatchResult::Error(_))
    }

    /// The success payload, if any.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            DispatchResult::Success(v) => Some(v),
            DispatchResult::Error(_) => None,
        }
    }

    /// The error kind, if any.
    pub fn error_kind(&self) -> Option<DispatchErrorKind> {
        match self {
            DispatchResult::Success(_) => None,
            DispatchResult::Error(e) => Some(e.kind),
        }
    }

    /// Read a top-level field of the success payload.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload().and_then(|p| p.get(key))
    }

    /// JSON rendering of this result.
    pub fn to_value(&self) -> Value {
        match self {
            DispatchResult::Success(v) => v.clone(),
            DispatchResult::Error(e) => serde_json::json!({
                "error": e.message,
                "kind": e.kind,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_builder() {
        let call = Invocation::new(json!("data"))
            .with_arg(1)
            .with_kwarg("x", 2)
            .with_kwarg("x", 3);
        assert_eq!(call.input, json!("data"));
        assert_eq!(call.arg(0), Some(&json!(1)));
        assert_eq!(call.kwarg("x"), Some(&json!(3)));
        assert!(call.kwarg("y").is_none());
    }

    #[test]
    fn test_default_invocation_has_null_input() {
        let call = Invocation::default();
        assert!(call.input.is_null());
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_error_result_shape() {
        let result = DispatchResult::error(DispatchErrorKind::AgentNotFound, "Agent Ghost not found");
        assert!(result.is_error());
        assert_eq!(result.error_kind(), Some(DispatchErrorKind::AgentNotFound));
        assert_eq!(
            result.to_value(),
            json!({"error": "Agent Ghost not found", "kind": "agent_not_found"})
        );
        assert_eq!(serde_json::to_value(&result).unwrap(), result.to_value());
    }

    #[test]
    fn test_success_result_passthrough() {
        let result = DispatchResult::success(json!({"result": 5}));
        assert!(result.is_success());
        assert_eq!(result.field("result"), Some(&json!(5)));
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"result": 5}));
    }

    #[test]
    fn test_untagged_deserialize_prefers_error() {
        let parsed: DispatchResult =
            serde_json::from_value(json!({"error": "boom", "kind": "timeout"})).unwrap();
        assert_eq!(parsed.error_kind(), Some(DispatchErrorKind::Timeout));

        let parsed: DispatchResult = serde_json::from_value(json!({"status": "ok"})).unwrap();
        assert!(parsed.is_success());
    }

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in [
            DispatchErrorKind::AgentNotFound,
            DispatchErrorKind::CapabilityNotFound,
            DispatchErrorKind::CapabilityFailure,
            DispatchErrorKind::Timeout,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, json!(kind.to_string()));
        }
    }
}
