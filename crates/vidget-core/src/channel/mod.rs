//! Channel adapter: the two send primitives used by the front end.
//!
//! - [`ChannelAdapter::send_one_shot`] opens a fresh connection for a single
//!   request/response pair.
//! - [`ChannelAdapter::send_correlated`] multiplexes requests over one
//!   persistent connection, established lazily and re-established on the next
//!   call after it drops. Each request gets a process-unique `_id`; the reply
//!   carrying that id resolves it. Exactly one of response, timeout or
//!   disconnect resolves every call.

mod connector;
mod correlator;
mod guard;
mod one_shot;
mod session;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;

use crate::error::AgentError;
use crate::protocol::{stamp_correlation_id, AgentRequest};

pub use connector::{AgentConnector, AgentReader, AgentStream, AgentWriter, ProcessConnector};
pub use correlator::{Correlator, Outcome};
pub use session::ChannelState;

use guard::PendingGuard;
use session::Session;

/// Default deadline for a correlated request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelTimeouts {
    /// Deadline for each correlated request.
    pub request: Duration,
    /// Optional deadline for a one-shot exchange (None = wait for the agent).
    pub one_shot: Option<Duration>,
}

impl Default for ChannelTimeouts {
    fn default() -> Self {
        Self {
            request: DEFAULT_REQUEST_TIMEOUT,
            one_shot: None,
        }
    }
}

pub struct ChannelAdapter {
    connector: Box<dyn AgentConnector>,
    timeouts: ChannelTimeouts,
    next_request_id: AtomicU64,
    next_session_id: AtomicU64,
    session: Mutex<Option<Arc<Session>>>,
}

impl ChannelAdapter {
    pub fn new(connector: impl AgentConnector + 'static, timeouts: ChannelTimeouts) -> Self {
        Self {
            connector: Box::new(connector),
            timeouts,
            next_request_id: AtomicU64::new(1),
            next_session_id: AtomicU64::new(1),
            session: Mutex::new(None),
        }
    }

    /// State of the persistent channel.
    pub fn state(&self) -> ChannelState {
        self.session_slot()
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(ChannelState::Disconnected)
    }

    /// Number of correlated requests currently waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.session_slot()
            .as_ref()
            .map(|s| s.correlator().len())
            .unwrap_or(0)
    }

    fn session_slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<Session>>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One request, one reply, on a connection of its own.
    pub async fn send_one_shot(&self, request: &AgentRequest) -> Result<Value, AgentError> {
        tracing::debug!(action = request.action(), "one-shot request");
        let stream = self.connector.connect()?;
        let exchange = one_shot::exchange(stream, request);
        match self.timeouts.one_shot {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .unwrap_or(Err(AgentError::Timeout)),
            None => exchange.await,
        }
    }

    /// Return the live session, connecting first if there is none. Connecting
    /// never suspends, so two callers cannot both open a session.
    fn connected_session(&self) -> Result<Arc<Session>, AgentError> {
        let mut slot = self.session_slot();
        if let Some(session) = slot.as_ref().filter(|s| s.is_connected()) {
            return Ok(Arc::clone(session));
        }
        let stream = self.connector.connect().map_err(|e| {
            tracing::warn!("agent connection failed: {}", e);
            e
        })?;
        let session = Session::start(
            self.next_session_id.fetch_add(1, Ordering::Relaxed),
            stream,
        );
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Send `request` on the persistent channel and wait for the reply that
    /// echoes its id.
    pub async fn send_correlated(&self, request: &AgentRequest) -> Result<Value, AgentError> {
        let session = self.connected_session()?;
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let mut message = request
            .to_value()
            .map_err(|e| AgentError::TransportFault(e.to_string()))?;
        stamp_correlation_id(&mut message, id);

        let mut completion = session.correlator().register(id)?;
        let _guard = PendingGuard {
            session: Arc::clone(&session),
            id,
        };
        tracing::debug!(
            request_id = id,
            session = session.id(),
            action = request.action(),
            "correlated request"
        );

        // One deadline covers the write and the wait: an agent that stops
        // reading its input must not stall the caller past the timeout.
        let deadline = tokio::time::Instant::now() + self.timeouts.request;
        let sent = tokio::time::timeout_at(deadline, session.transmit(&message)).await;
        match sent {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(request_id = id, "transmit failed: {}", err);
                session.correlator().resolve(id, Err(err));
                session.shutdown("transmit failed").await;
            }
            Err(_) => {
                tracing::warn!(
                    request_id = id,
                    timeout_ms = self.timeouts.request.as_millis() as u64,
                    "transmit stalled, agent is not reading"
                );
                session.correlator().resolve(id, Err(AgentError::Timeout));
                // The frame may be half written; the stream cannot be reused.
                session.shutdown("transmit stalled").await;
            }
        }

        let received = match tokio::time::timeout_at(deadline, &mut completion).await {
            Ok(received) => received,
            Err(_) => {
                if session.correlator().resolve(id, Err(AgentError::Timeout)) {
                    tracing::warn!(
                        request_id = id,
                        timeout_ms = self.timeouts.request.as_millis() as u64,
                        "correlated request timed out"
                    );
                }
                // Whichever resolution won is waiting in the handle now.
                (&mut completion).await
            }
        };
        received.unwrap_or(Err(AgentError::Disconnected))
    }

    /// Tear down the persistent channel, failing anything still pending.
    pub async fn disconnect(&self) -> usize {
        let session = self.session_slot().take();
        match session {
            Some(session) => session.shutdown("closed by client").await,
            None => 0,
        }
    }
}

impl std::fmt::Debug for ChannelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAdapter")
            .field("timeouts", &self.timeouts)
            .field("state", &self.state())
            .field("pending", &self.pending_count())
            .finish_non_exhaustive()
    }
}
