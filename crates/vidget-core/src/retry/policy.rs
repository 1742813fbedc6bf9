use std::time::Duration;

/// High-level classification of an error for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response before the request deadline.
    Timeout,
    /// Channel dropped or a write failed.
    Connection,
    /// Agent could not be started or reached.
    Unavailable,
    /// Reply could not be decoded.
    Malformed,
    /// Agent explicitly reported an error (not retried).
    AgentReported,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::AgentReported)
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fixed-delay retry policy.
///
/// Polling never gives up on a transient failure; it only stretches the
/// interval to `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before reissuing a failed query.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Decide what to do after a failed query.
    pub fn decide(&self, kind: ErrorKind) -> RetryDecision {
        if kind.is_transient() {
            RetryDecision::RetryAfter(self.delay)
        } else {
            RetryDecision::NoRetry
        }
    }
}
