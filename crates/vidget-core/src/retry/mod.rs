//! Retry and backoff policy for agent queries.
//!
//! Classifies [`AgentError`](crate::error::AgentError)s into transient and
//! terminal kinds and decides whether (and after how long) a failed query
//! should be reissued. The progress poller is the main consumer: channel
//! hiccups are retried with a fixed backoff, explicit agent errors are not.

mod classify;
mod policy;

pub use classify::classify;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
