//! Map agent errors to retry policy error kinds.

use crate::error::AgentError;
use crate::retry::policy::ErrorKind;

/// Classify an agent error for retry decisions.
pub fn classify(e: &AgentError) -> ErrorKind {
    match e {
        AgentError::Timeout => ErrorKind::Timeout,
        AgentError::Disconnected | AgentError::TransportFault(_) => ErrorKind::Connection,
        // The agent may be installed or restarted while we wait.
        AgentError::AgentNotFound(_) | AgentError::ConnectionUnavailable(_) => {
            ErrorKind::Unavailable
        }
        AgentError::MalformedResponse(_) => ErrorKind::Malformed,
        AgentError::AgentReported(_) => ErrorKind::AgentReported,
    }
}
