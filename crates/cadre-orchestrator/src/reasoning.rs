use crate::policy::{NeverRedecompose, ReassessPolicy};
use crate::task_queue::TaskQueue;
use crate::types::{EngineState, Execution, RunOutcome, RunReport, Task};
use cadre_agents::AgentManager;
use cadre_core::{
    CadreError, CadreResult, ContextSource, Decomposer, DispatchErrorKind, DispatchResult,
    NoContext,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tunables for a [`ReasoningEngine`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// How many recent buffered turns go into the decomposition context.
    #[serde(default = "default_context_turns")]
    pub context_turns: usize,
    /// Key looked up in the memory store for extra context.
    #[serde(default = "default_memory_key")]
    pub memory_key: String,
    /// Upper bound on re-decompositions within one run.
    #[serde(default = "default_max_redecompositions")]
    pub max_redecompositions: u32,
}

fn default_context_turns() -> usize {
    5
}

fn default_memory_key() -> String {
    "latest".to_string()
}

fn default_max_redecompositions() -> u32 {
    3
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            context_turns: default_context_turns(),
            memory_key: default_memory_key(),
            max_redecompositions: default_max_redecompositions(),
        }
    }
}

/// Drives one objective from decomposition to a terminal state.
///
/// The engine exclusively owns its [`TaskQueue`]; the agent registry is
/// shared. One engine handles one objective: once a run reaches
/// [`EngineState::Done`] a fresh engine is needed for the next one.
pub struct ReasoningEngine {
    manager: Arc<AgentManager>,
    decomposer: Arc<dyn Decomposer>,
    context: Arc<dyn ContextSource>,
    policy: Box<dyn ReassessPolicy>,
    config: ReasoningConfig,
    queue: TaskQueue,
    state: EngineState,
    redecompositions: u32,
}

impl ReasoningEngine {
    /// Create an engine with no memory context and no re-decomposition.
    pub fn new(manager: Arc<AgentManager>, decomposer: Arc<dyn Decomposer>) -> Self {
        Self {
            manager,
            decomposer,
            context: Arc::new(NoContext),
            policy: Box::new(NeverRedecompose),
            config: ReasoningConfig::default(),
            queue: TaskQueue::new(),
            state: EngineState::Idle,
            redecompositions: 0,
        }
    }

    /// Read conversation memory from `context` when decomposing.
    pub fn with_context(mut self, context: Arc<dyn ContextSource>) -> Self {
        self.context = context;
        self
    }

    /// Replace the re-decomposition policy.
    pub fn with_policy(mut self, policy: impl ReassessPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ReasoningConfig) -> Self {
        self.config = config;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The pending tasks.
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Queue a task directly, bypassing decomposition.
    pub fn enqueue(&mut self, task: Task) {
        self.queue.push(task);
    }

    /// Re-decompositions performed so far.
    pub fn redecompositions(&self) -> u32 {
        self.redecompositions
    }

    /// Assemble the decomposition context from conversation memory.
    ///
    /// Rendered as `Buffer: <turns, most recent first, joined by " | ">,
    /// Memory: <lookup result>`. A failing lookup is logged and left blank.
    pub async fn build_context(&self) -> String {
        let turns = self.context.recent_context(self.config.context_turns).await;
        let stored = match self.context.lookup(&self.config.memory_key).await {
            Ok(found) => found.unwrap_or_default(),
            Err(e) => {
                warn!(key = %self.config.memory_key, error = %e, "Memory lookup failed");
                String::new()
            }
        };
        format!("Buffer: {}, Memory: {}", turns.join(" | "), stored)
    }

    /// Decompose `objective` and append every well-formed task exactly once.
    ///
    /// Records missing a name or a details object are skipped. Returns the
    /// number of tasks queued. Never clears the queue.
    pub async fn decompose(&mut self, objective: &str) -> CadreResult<usize> {
        self.state = EngineState::Decomposing;
        let context = self.build_context().await;
        let records = self.decomposer.decompose(objective, &context).await?;

        let mut queued = 0;
        for record in &records {
            match Task::from_record(record) {
                Ok(task) => {
                    debug!(task = %task.name, function = %task.function, "Queued task");
                    self.queue.push(task);
                    queued += 1;
                }
                Err(reason) => debug!(%reason, "Skipping malformed task record"),
            }
        }

        info!(
            objective = %objective,
            received = records.len(),
            queued,
            pending = self.queue.len(),
            "Decomposition complete"
        );
        Ok(queued)
    }

    /// Pop the front task and dispatch it.
    ///
    /// The task is consumed before dispatch, whatever the outcome. Returns
    /// [`Execution::Empty`] when there is nothing to do.
    pub async fn execute_next(&mut self) -> Execution {
        let Some(task) = self.queue.pop() else {
            return Execution::Empty;
        };
        self.state = EngineState::Executing;

        let agent = task
            .agent
            .clone()
            .or_else(|| self.manager.resolve_capability(&task.function));

        let result = match agent {
            Some(agent) => {
                debug!(task = %task.name, agent = %agent, function = %task.function, "Executing task");
                self.manager
                    .dispatch(&agent, &task.function, task.invocation())
                    .await
            }
            None => DispatchResult::error(
                DispatchErrorKind::CapabilityNotFound,
                format!("No registered agent exposes capability {}", task.function),
            ),
        };

        if let DispatchResult::Error(e) = &result {
            warn!(task = %task.name, kind = %e.kind, error = %e.message, "Task dispatch failed");
        }

        Execution::Dispatched { task, result }
    }

    /// Judge a result against the objective. Returns `true` when satisfied.
    ///
    /// A payload carrying `"success": true` satisfies the objective.
    /// Otherwise the policy may request re-decomposition, bounded by
    /// `max_redecompositions`; decomposer failures at this point are logged
    /// and do not abort the run.
    pub async fn assess(&mut self, result: &DispatchResult, objective: &str) -> bool {
        self.state = EngineState::Assessing;

        if result.field("success") == Some(&Value::Bool(true)) {
            info!(
                result = %result.field("result").cloned().unwrap_or(serde_json::Value::Null),
                "Task completed successfully"
            );
            return true;
        }

        let Some(next_objective) = self.policy.reassess(result, objective).await else {
            return false;
        };

        if self.redecompositions >= self.config.max_redecompositions {
            warn!(
                limit = self.config.max_redecompositions,
                "Re-decomposition limit reached, dropping failed task"
            );
            return false;
        }

        self.redecompositions += 1;
        info!(
            objective = %next_objective,
            attempt = self.redecompositions,
            "Updating tasks based on assessment"
        );
        if let Err(e) = self.decompose(&next_objective).await {
            warn!(error = %e, "Re-decomposition failed");
        }
        self.state = EngineState::Assessing;
        false
    }

    /// Decompose `objective`, then execute and assess until it is satisfied
    /// or the queue is exhausted.
    ///
    /// Task-level failures never surface as errors here; only a failing
    /// initial decomposition or reuse of a finished engine does.
    pub async fn run(&mut self, objective: &str) -> CadreResult<RunReport> {
        if self.state == EngineState::Done {
            return Err(CadreError::Orchestrator(
                "Reasoning engine already finished; create a new engine per objective".into(),
            ));
        }

        info!(objective = %objective, "Reasoning run started");
        if let Err(e) = self.decompose(objective).await {
            self.state = EngineState::Done;
            return Err(e);
        }

        let mut tasks_executed = 0;
        let mut last_result = None;
        let outcome = loop {
            match self.execute_next().await {
                Execution::Empty => break RunOutcome::Exhausted,
                Execution::Dispatched { result, .. } => {
                    tasks_executed += 1;
                    let satisfied = self.assess(&result, objective).await;
                    last_result = Some(result);
                    if satisfied {
                        break RunOutcome::Satisfied;
                    }
                }
            }
        };

        self.state = EngineState::Done;
        info!(
            ?outcome,
            tasks_executed,
            redecompositions = self.redecompositions,
            remaining = self.queue.len(),
            "Reasoning run finished"
        );

        Ok(RunReport {
            outcome,
            tasks_executed,
            redecompositions: self.redecompositions,
            tasks_remaining: self.queue.len(),
            last_result,
        })
    }
}
