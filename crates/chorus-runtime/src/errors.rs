//! Error taxonomy for team runs.
//!
//! Resource-teardown errors never appear here: teardown is best-effort and
//! recovered locally (logged). Everything else surfaces to the caller as a
//! terminal `error` event, a returned error, or both. There are no retries
//! anywhere in this crate.

use chorus_audio::DecodeError;

/// Failure raised by the external agent executor.
///
/// The executor is opaque to this crate, so its failures are carried as a
/// message (including whatever timeout errors the executor's network layer
/// produced).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutorError {
    /// Human-readable failure description.
    pub message: String,
}

impl ExecutorError {
    /// Create a new executor error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors surfaced by a team run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A referenced agent name does not exist in the team configuration.
    #[error("agent '{0}' not found in team configuration")]
    AgentNotFound(String),

    /// Tool-server connection failure; aborts the run before any agent turn.
    #[error("tool connection failed: {0}")]
    ResourceAcquisition(String),

    /// The default session store failed to create a session.
    #[error("session creation failed: {0}")]
    SessionCreation(String),

    /// The underlying agent executor failed mid-run or mid-stream.
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutorError),

    /// No audio format matched the inbound voice buffer.
    #[error("audio decode failed: {0}")]
    AudioDecode(#[from] DecodeError),
}

impl RunError {
    /// Taxonomy label, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentNotFound(_) => "configuration",
            Self::ResourceAcquisition(_) | Self::SessionCreation(_) => "resource_acquisition",
            Self::Execution(_) => "execution",
            Self::AudioDecode(_) => "decode",
        }
    }
}
