use crate::capability::{AsyncFnCapability, Capability, FnCapability};
use cadre_core::{CadreError, CadreResult, DispatchErrorKind, DispatchResult, Invocation};
use futures_util::FutureExt;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Input-shape tag used when an agent does not declare one.
pub const DEFAULT_INPUT_TYPE: &str = "JSON";

/// A named bundle of capabilities with a documented input shape.
///
/// The capability table is fixed at construction. Names are unique and
/// iteration follows the order capabilities were added to the builder.
pub struct DynamicAgent {
    name: String,
    description: String,
    input_type: String,
    order: Vec<String>,
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl std::fmt::Debug for DynamicAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicAgent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_type", &self.input_type)
            .field("capabilities", &self.order)
            .finish()
    }
}

impl DynamicAgent {
    /// Start building an agent.
    pub fn builder(name: impl Into<String>, description: impl Into<String>) -> AgentBuilder {
        AgentBuilder {
            name: name.into(),
            description: description.into(),
            input_type: DEFAULT_INPUT_TYPE.to_string(),
            capabilities: Vec::new(),
        }
    }

    /// Registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Free-form description of the expected input format.
    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    /// Capability names in declaration order.
    pub fn capability_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Whether the agent exposes `capability`.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains_key(capability)
    }

    /// Number of capabilities.
    pub fn capability_count(&self) -> usize {
        self.order.len()
    }

    /// Invoke one of this agent's capabilities.
    ///
    /// Never returns an `Err` or unwinds: an unknown capability, an error
    /// returned by the capability, a panic inside it, or an elapsed
    /// `timeout` all become error results.
    pub async fn execute(
        &self,
        capability: &str,
        call: Invocation,
        timeout: Option<Duration>,
    ) -> DispatchResult {
        let Some(cap) = self.capabilities.get(capability) else {
            return DispatchResult::error(
                DispatchErrorKind::CapabilityNotFound,
                format!("Capability {capability} not found in {}", self.name),
            );
        };

        let invocation = AssertUnwindSafe(cap.invoke(call)).catch_unwind();
        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        agent = %self.name,
                        capability = %capability,
                        timeout_ms = limit.as_millis() as u64,
                        "Capability timed out"
                    );
                    return DispatchResult::error(
                        DispatchErrorKind::Timeout,
                        format!(
                            "Capability {capability} in {} timed out after {}ms",
                            self.name,
                            limit.as_millis()
                        ),
                    );
                }
            },
            None => invocation.await,
        };

        match outcome {
            Ok(Ok(payload)) => DispatchResult::Success(payload),
            Ok(Err(e)) => {
                warn!(agent = %self.name, capability = %capability, error = %e, "Capability failed");
                DispatchResult::error(
                    DispatchErrorKind::CapabilityFailure,
                    format!("Capability {capability} in {} failed: {e}", self.name),
                )
            }
            Err(panic) => {
                let reason = panic_message(panic.as_ref());
                warn!(agent = %self.name, capability = %capability, panic = %reason, "Capability panicked");
                DispatchResult::error(
                    DispatchErrorKind::CapabilityFailure,
                    format!("Capability {capability} in {} panicked: {reason}", self.name),
                )
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for [`DynamicAgent`]. Validation happens in [`AgentBuilder::build`].
pub struct AgentBuilder {
    name: String,
    description: String,
    input_type: String,
    capabilities: Vec<(String, Arc<dyn Capability>)>,
}

impl AgentBuilder {
    /// Document the expected input format (defaults to `"JSON"`).
    pub fn input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = input_type.into();
        self
    }

    /// Add a capability object.
    pub fn capability(mut self, name: impl Into<String>, capability: Arc<dyn Capability>) -> Self {
        self.capabilities.push((name.into(), capability));
        self
    }

    /// Add a synchronous closure as a capability.
    pub fn capability_fn<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Invocation) -> CadreResult<Value> + Send + Sync + 'static,
    {
        self.capability(name, Arc::new(FnCapability::new(f)))
    }

    /// Add an async closure as a capability.
    pub fn capability_async<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CadreResult<Value>> + Send + 'static,
    {
        self.capability(name, Arc::new(AsyncFnCapability::new(f)))
    }

    /// Finish the agent, rejecting empty or duplicate names.
    pub fn build(self) -> CadreResult<DynamicAgent> {
        if self.name.trim().is_empty() {
            return Err(CadreError::Config("Agent name must not be empty".into()));
        }

        let mut order = Vec::with_capacity(self.capabilities.len());
        let mut capabilities = HashMap::with_capacity(self.capabilities.len());
        for (cap_name, cap) in self.capabilities {
            if cap_name.trim().is_empty() {
                return Err(CadreError::Config(format!(
                    "Agent '{}' has a capability with an empty name",
                    self.name
                )));
            }
            if capabilities.insert(cap_name.clone(), cap).is_some() {
                return Err(CadreError::Config(format!(
                    "Agent '{}' declares capability '{cap_name}' more than once",
                    self.name
                )));
            }
            order.push(cap_name);
        }

        Ok(DynamicAgent {
            name: self.name,
            description: self.description,
            input_type: self.input_type,
            order,
            capabilities,
        })
    }
}
