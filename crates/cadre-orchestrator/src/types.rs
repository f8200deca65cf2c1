use cadre_core::{DispatchResult, Invocation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One unit of planned work: target capability, keyword arguments, input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Human-readable task name.
    pub name: String,
    /// Agent to dispatch to. When absent the first agent exposing
    /// `function` is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Capability name.
    pub function: String,
    /// Keyword arguments passed to the capability.
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Input payload passed first to the capability.
    #[serde(default)]
    pub input: Value,
}

/// Why a decomposition record could not become a [`Task`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedTask {
    /// The record is not a JSON object.
    #[error("task record is not an object")]
    NotAnObject,
    /// `name` is missing, empty, or not a string.
    #[error("task record has no name")]
    MissingName,
    /// `details` is missing or not an object.
    #[error("task '{0}' has no details object")]
    MissingDetails(String),
}

impl Task {
    /// Create a task targeting `function` with no arguments.
    pub fn new(name: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent: None,
            function: function.into(),
            details: Map::new(),
            input: Value::Null,
        }
    }

    /// Pin the task to a specific agent.
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the keyword arguments.
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = details;
        self
    }

    /// Set the input payload.
    pub fn with_input(mut self, input: impl Into<Value>) -> Self {
        self.input = input.into();
        self
    }

    /// Normalize a raw decomposition record.
    ///
    /// `name` (non-empty string) and `details` (object) are required;
    /// `function` defaults to the name, `agent` is optional and `input`
    /// defaults to `null`.
    pub fn from_record(record: &Value) -> Result<Self, MalformedTask> {
        let obj = record.as_object().ok_or(MalformedTask::NotAnObject)?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or(MalformedTask::MissingName)?;

        let details = obj
            .get("details")
            .and_then(Value::as_object)
            .ok_or_else(|| MalformedTask::MissingDetails(name.to_string()))?;

        let function = obj
            .get("function")
            .and_then(Value::as_str)
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(name);

        let agent = obj
            .get("agent")
            .and_then(Value::as_str)
            .filter(|a| !a.trim().is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            agent,
            function: function.to_string(),
            details: details.clone(),
            input: obj.get("input").cloned().unwrap_or(Value::Null),
        })
    }

    /// Arguments for dispatching this task.
    pub fn invocation(&self) -> Invocation {
        Invocation::new(self.input.clone()).with_kwargs(self.details.clone())
    }
}

/// Lifecycle of a [`crate::ReasoningEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Nothing has happened yet.
    Idle,
    /// Waiting on the decomposition collaborator.
    Decomposing,
    /// Dispatching a task.
    Executing,
    /// Judging a result.
    Assessing,
    /// Terminal: satisfied or queue exhausted.
    Done,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Decomposing => write!(f, "decomposing"),
            EngineState::Executing => write!(f, "executing"),
            EngineState::Assessing => write!(f, "assessing"),
            EngineState::Done => write!(f, "done"),
        }
    }
}

/// Outcome of a single `execute_next` step.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The queue was empty; nothing ran.
    Empty,
    /// A task was consumed and dispatched.
    Dispatched {
        /// The consumed task.
        task: Task,
        /// What dispatch returned.
        result: DispatchResult,
    },
}

impl Execution {
    /// Whether this is the empty-queue sentinel.
    pub fn is_empty(&self) -> bool {
        matches!(self, Execution::Empty)
    }

    /// The dispatch result, if a task ran.
    pub fn result(&self) -> Option<&DispatchResult> {
        match self {
            Execution::Empty => None,
            Execution::Dispatched { result, .. } => Some(result),
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// A task reported success.
    Satisfied,
    /// The queue ran dry without a success.
    Exhausted,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Why the run stopped.
    pub outcome: RunOutcome,
    /// Number of tasks consumed.
    pub tasks_executed: usize,
    /// Number of re-decompositions performed.
    pub redecompositions: u32,
    /// Tasks still queued when the run stopped.
    pub tasks_remaining: usize,
    /// The last dispatch result seen.
    pub last_result: Option<DispatchResult>,
}
