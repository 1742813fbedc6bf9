//! Error taxonomy for agent exchanges.
//!
//! Every variant is returned to the caller as a value; nothing here is raised
//! outside the result of the call that caused it. `Clone` lets a single channel
//! loss resolve every pending request with the same error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// The agent executable is not installed where we were told to find it.
    #[error("agent not found: {0}")]
    AgentNotFound(String),
    /// The agent exists but could not be started or reached.
    #[error("agent unavailable: {0}")]
    ConnectionUnavailable(String),
    /// The persistent channel dropped while the request was in flight.
    #[error("disconnected")]
    Disconnected,
    /// No response arrived before the request deadline.
    #[error("timeout")]
    Timeout,
    /// The agent answered with an explicit error payload.
    #[error("{0}")]
    AgentReported(String),
    /// Writing the request to the channel failed.
    #[error("transport fault: {0}")]
    TransportFault(String),
    /// The reply could not be decoded or lacked required fields.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl AgentError {
    /// Map an error from starting the agent process. A missing executable gets
    /// its own variant so the front end can show an installation hint.
    pub fn from_spawn(program: &str, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            AgentError::AgentNotFound(program.to_string())
        } else {
            AgentError::ConnectionUnavailable(format!("{program}: {err}"))
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AgentError::AgentNotFound(_))
    }
}
