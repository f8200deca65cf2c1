use crate::agent::{DynamicAgent, DEFAULT_INPUT_TYPE};
use cadre_core::{DispatchErrorKind, DispatchResult, Invocation};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const CATALOGUE_HEADER: &str =
    "You have access to multiple specialized agents with unique functionalities:\n\n";
const CATALOGUE_FOOTER: &str = "\nYou can instruct these agents to perform tasks for you. What would you like to do? \
Remember to return the answer in the following format: {'result': 'your answer', 'success': True}";

#[derive(Default)]
struct AgentTable {
    order: Vec<String>,
    by_name: HashMap<String, Arc<DynamicAgent>>,
}

/// Central registry of agents.
///
/// Shared between the reasoning engine and any number of assignments through
/// an `Arc`. Writes take an exclusive lock; dispatch clones the target agent's
/// `Arc` under a read lock and releases it before invoking, so a dispatch
/// always sees a fully registered agent and never holds the lock across an
/// await point.
pub struct AgentManager {
    agents: RwLock<AgentTable>,
    expected_input_type: String,
    dispatch_timeout: Option<Duration>,
}

impl AgentManager {
    /// Create an empty registry with the default `"JSON"` input tag.
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(AgentTable::default()),
            expected_input_type: DEFAULT_INPUT_TYPE.to_string(),
            dispatch_timeout: None,
        }
    }

    /// Override the default expected-input tag.
    pub fn with_expected_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.expected_input_type = input_type.into();
        self
    }

    /// Bound every capability invocation by `timeout`.
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = Some(timeout);
        self
    }

    /// The default expected-input tag.
    pub fn expected_input_type(&self) -> &str {
        &self.expected_input_type
    }

    /// The per-dispatch timeout, if any.
    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout
    }

    /// Register an agent under its name, returning the agent it replaced.
    pub fn register(&self, agent: DynamicAgent) -> Option<Arc<DynamicAgent>> {
        let name = agent.name().to_string();
        let capabilities = agent.capability_count();
        let mut table = self.agents.write();
        let previous = table.by_name.insert(name.clone(), Arc::new(agent));
        if previous.is_some() {
            warn!(agent = %name, "Agent re-registered, previous definition replaced");
        } else {
            table.order.push(name.clone());
        }
        info!(agent = %name, capabilities, "Registered agent");
        previous
    }

    /// Look up an agent by name.
    pub fn get(&self, name: &str) -> Option<Arc<DynamicAgent>> {
        self.agents.read().by_name.get(name).cloned()
    }

    /// Agent names in registration order.
    pub fn agent_names(&self) -> Vec<String> {
        self.agents.read().order.clone()
    }

    /// Number of registered agents.
    pub fn agent_count(&self) -> usize {
        self.agents.read().order.len()
    }

    /// The first agent, in registration order, exposing `capability`.
    pub fn resolve_capability(&self, capability: &str) -> Option<String> {
        let table = self.agents.read();
        table
            .order
            .iter()
            .find(|name| {
                table
                    .by_name
                    .get(name.as_str())
                    .is_some_and(|a| a.has_capability(capability))
            })
            .cloned()
    }

    /// Resolve `(agent, capability)` and invoke it with `call`.
    ///
    /// Never returns an error type; see [`DynamicAgent::execute`] for how
    /// capability failures are folded into the result.
    pub async fn dispatch(&self, agent: &str, capability: &str, call: Invocation) -> DispatchResult {
        let Some(target) = self.get(agent) else {
            debug!(agent = %agent, capability = %capability, "Dispatch to unknown agent");
            return DispatchResult::error(
                DispatchErrorKind::AgentNotFound,
                format!("Agent {agent} not found"),
            );
        };

        debug!(agent = %agent, capability = %capability, "Dispatching");
        target.execute(capability, call, self.dispatch_timeout).await
    }

    /// Render the capability catalogue for inclusion in an LLM prompt.
    pub fn describe(&self) -> String {
        let table = self.agents.read();
        let mut prompt = String::from(CATALOGUE_HEADER);
        for agent in table.order.iter().filter_map(|n| table.by_name.get(n)) {
            prompt.push_str(&format!(
                "- {}: {} with the following capabilities:\n. It requires that the input looks like this: {}\n",
                agent.name(),
                agent.description(),
                agent.input_type()
            ));
            for capability in agent.capability_names() {
                prompt.push_str(&format!("  - {capability}\n"));
            }
        }
        prompt.push_str(CATALOGUE_FOOTER);
        prompt
    }
}

impl Default for AgentManager {
    fn default() -> Self {
        Self::new()
    }
}
