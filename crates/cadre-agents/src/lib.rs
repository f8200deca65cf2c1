//! Capability registry and dispatch.
//!
//! An agent is a named bundle of capabilities; the [`AgentManager`] maps agent
//! names to agents and resolves `(agent, capability)` pairs into invocations.
//! Dispatch never fails with an `Err`: missing targets, capability errors,
//! panics and timeouts all come back as [`cadre_core::DispatchResult`] data.

/// Agent definitions and their builder.
pub mod agent;
/// The capability abstraction and closure adapters.
pub mod capability;
/// The agent registry.
pub mod manager;

pub use agent::{AgentBuilder, DynamicAgent};
pub use capability::{AsyncFnCapability, Capability, FnCapability};
pub use manager::AgentManager;
