use thiserror::Error;

/// A convenience `Result` alias using [`CadreError`].
pub type CadreResult<T> = Result<T, CadreError>;

/// Top-level error type for the Cadre workspace.
///
/// Each variant corresponds to a subsystem that can produce errors. Failures
/// of a dispatched capability are not reported through this type once they
/// leave the registry; they become [`crate::DispatchError`] values instead.
#[derive(Error, Debug)]
pub enum CadreError {
    /// An error from agent construction or the reasoning collaborators.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error raised by a capability during invocation.
    #[error("Capability error: {0}")]
    Capability(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the conversation buffer or a memory store.
    #[error("Memory error: {0}")]
    Memory(String),

    /// An error from an outbound HTTP request (e.g. LLM API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error from the reasoning engine or an assignment.
    #[error("Orchestrator error: {0}")]
    Orchestrator(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
