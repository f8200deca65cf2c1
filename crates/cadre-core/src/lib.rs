//! Core types and error definitions for the Cadre orchestration engine.
//!
//! This crate provides the foundational types shared across all Cadre crates:
//! the unified error enum, the dispatch result taxonomy, capability call
//! arguments, conversation messages, and the collaborator traits through which
//! the engine reaches the language model and conversation memory.
//!
//! # Main types
//!
//! - [`CadreError`] — Unified error enum for all Cadre subsystems.
//! - [`CadreResult`] — Convenience alias for `Result<T, CadreError>`.
//! - [`Invocation`] — Input payload plus positional and keyword arguments for a capability.
//! - [`DispatchResult`] — Success payload or structured [`DispatchError`], never a panic.
//! - [`Message`] — A single message exchanged with a language model.
//! - [`Decomposer`] — Turns an objective plus context into task-shaped records.
//! - [`ContextSource`] — Read-only view over buffered and stored conversation memory.

/// Collaborator traits consumed by the orchestration engine.
pub mod collaborator;
/// Dispatch results and capability call arguments.
pub mod dispatch;
/// Error types.
pub mod error;
/// Conversation messages.
pub mod message;

pub use collaborator::{ContextSource, Decomposer, NoContext};
pub use dispatch::{DispatchError, DispatchErrorKind, DispatchResult, Invocation};
pub use error::{CadreError, CadreResult};
pub use message::{Message, Role};
