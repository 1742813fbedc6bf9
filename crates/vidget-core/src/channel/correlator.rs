//! Request correlation: id → single-assignment completion handle.
//!
//! Every pending entry leaves the map through [`Correlator::resolve`] (response,
//! timeout, transport fault), [`Correlator::close`] (channel loss) or
//! [`Correlator::forget`] (waiter dropped). Resolving an id that is no longer
//! pending is a no-op.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::AgentError;
use crate::protocol::correlation_id;

/// What a waiting caller eventually receives.
pub type Outcome = Result<Value, AgentError>;

#[derive(Debug)]
struct PendingRequest {
    completion: oneshot::Sender<Outcome>,
    created_at: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    pending: HashMap<u64, PendingRequest>,
    closed: bool,
}

/// Pending-request table for one channel session.
#[derive(Debug, Default)]
pub struct Correlator {
    inner: Mutex<Inner>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a waiter for `id`. Fails with `Disconnected` once the session
    /// has been closed, so no entry can be created after the disconnect sweep.
    pub fn register(&self, id: u64) -> Result<oneshot::Receiver<Outcome>, AgentError> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(AgentError::Disconnected);
        }
        let (tx, rx) = oneshot::channel();
        let previous = inner.pending.insert(
            id,
            PendingRequest {
                completion: tx,
                created_at: Instant::now(),
            },
        );
        debug_assert!(previous.is_none(), "correlation id {id} reused while pending");
        Ok(rx)
    }

    /// Resolve `id` with `outcome` and remove it. Returns false if `id` was not
    /// pending (already resolved, swept, or never registered).
    pub fn resolve(&self, id: u64, outcome: Outcome) -> bool {
        let Some(entry) = self.lock().pending.remove(&id) else {
            return false;
        };
        tracing::trace!(
            request_id = id,
            elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "request resolved"
        );
        // The waiter may already be gone; that is not a fault.
        let _ = entry.completion.send(outcome);
        true
    }

    /// Route an inbound message to its waiter by the echoed id. Messages with
    /// no id or an id that is not pending are discarded.
    pub fn dispatch(&self, message: Value) -> bool {
        match correlation_id(&message) {
            Some(id) => {
                let matched = self.resolve(id, Ok(message));
                if !matched {
                    tracing::debug!(request_id = id, "discarding response with no pending request");
                }
                matched
            }
            None => {
                tracing::debug!("discarding agent message without correlation id");
                false
            }
        }
    }

    /// Drop the entry for `id` without notifying anyone.
    pub fn forget(&self, id: u64) -> bool {
        self.lock().pending.remove(&id).is_some()
    }

    /// Resolve every pending entry with `err` and refuse new registrations.
    /// Returns how many entries were swept.
    pub fn close(&self, err: AgentError) -> usize {
        let drained: Vec<PendingRequest> = {
            let mut inner = self.lock();
            inner.closed = true;
            inner.pending.drain().map(|(_, entry)| entry).collect()
        };
        let swept = drained.len();
        for entry in drained {
            let _ = entry.completion.send(Err(err.clone()));
        }
        swept
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
