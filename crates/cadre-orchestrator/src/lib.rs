//! Objective-driven task orchestration on top of the agent registry.
//!
//! A [`ReasoningEngine`] decomposes an objective into tasks through an
//! external [`cadre_core::Decomposer`], executes them one at a time through
//! the shared [`cadre_agents::AgentManager`], and assesses every result until
//! the objective is satisfied or the queue runs dry. Independently, any number
//! of [`Assignment`]s poll a single capability on a fixed interval and fire a
//! one-shot action when their condition first holds.
//!
//! # Main types
//!
//! - [`ReasoningEngine`] — Decompose → execute → assess loop over one objective.
//! - [`ReassessPolicy`] — Pluggable decision on whether a failed step re-decomposes.
//! - [`Assignment`] — Conditional background poller with a one-way stop.
//! - [`TaskQueue`] — FIFO queue of [`Task`]s owned by one engine.

/// Conditional background polling.
pub mod assignment;
/// Re-decomposition policies.
pub mod policy;
/// The reasoning engine.
pub mod reasoning;
/// FIFO task queue.
pub mod task_queue;
/// Tasks, engine states and run reports.
pub mod types;

pub use assignment::{Assignment, PollOutcome};
pub use policy::{NeverRedecompose, ReassessPolicy, RedecomposeOnFailure};
pub use reasoning::{ReasoningConfig, ReasoningEngine};
pub use task_queue::TaskQueue;
pub use types::{EngineState, Execution, MalformedTask, RunOutcome, RunReport, Task};
