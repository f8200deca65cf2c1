//! Conversation memory for the reasoning engine.
//!
//! A small rolling buffer keeps the most recent question/answer turns; once
//! it fills up, the batch is flushed to a [`MemoryStore`]. The
//! [`MemoryManager`] ties the two together and exposes them to the engine as
//! a read-only [`cadre_core::ContextSource`].
//!
//! # Main types
//!
//! - [`Conversation`] — One question/answer turn.
//! - [`ConversationBuffer`] — Bounded in-process buffer of recent turns.
//! - [`MemoryStore`] — Trait for persistent conversation storage.
//! - [`InMemoryStore`] / [`FileMemoryStore`] — Volatile and JSON-file backends.
//! - [`MemoryManager`] — Buffer + store, implementing `ContextSource`.

/// Conversation turns and the rolling buffer.
pub mod buffer;
/// Buffer and store combined.
pub mod manager;
/// Persistent conversation stores.
pub mod store;

pub use buffer::{Conversation, ConversationBuffer, DEFAULT_BUFFER_CAPACITY};
pub use manager::{MemoryConfig, MemoryManager};
pub use store::{FileMemoryStore, InMemoryStore, MemoryStore, StoredConversation};
