//! One persistent channel instance and its reader task.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::io::AsyncWriteExt;

use super::connector::{reap, AgentReader, AgentStream, AgentWriter};
use super::correlator::Correlator;
use crate::error::AgentError;
use crate::protocol::{self, FrameError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connected,
}

/// A connected channel: the write half, the pending table it owns, and its
/// state. The read half lives in the reader task spawned by [`Session::start`].
pub(crate) struct Session {
    id: u64,
    state: Mutex<ChannelState>,
    writer: tokio::sync::Mutex<Option<AgentWriter>>,
    correlator: Correlator,
}

impl Session {
    /// Take ownership of `stream` and spawn the task that routes inbound
    /// messages. The reader task also owns the agent process, if any.
    pub(crate) fn start(id: u64, stream: AgentStream) -> Arc<Self> {
        let AgentStream {
            reader,
            writer,
            child,
        } = stream;
        let session = Arc::new(Self {
            id,
            state: Mutex::new(ChannelState::Connected),
            writer: tokio::sync::Mutex::new(Some(writer)),
            correlator: Correlator::new(),
        });
        tracing::info!(session = id, "agent channel connected");

        let task_session = Arc::clone(&session);
        tokio::spawn(async move {
            let reason = read_loop(reader, &task_session.correlator).await;
            task_session.mark_disconnected(&reason);
            reap(child);
        });
        session
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn state(&self) -> ChannelState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    pub(crate) fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    /// Write one message. A missing writer means the session was torn down.
    pub(crate) async fn transmit(&self, message: &Value) -> Result<(), AgentError> {
        let mut writer = self.writer.lock().await;
        if !self.is_connected() {
            return Err(AgentError::Disconnected);
        }
        let writer = writer.as_mut().ok_or(AgentError::Disconnected)?;
        protocol::write_message(writer, message)
            .await
            .map_err(|e| AgentError::TransportFault(e.to_string()))
    }

    /// Connected → Disconnected: sweep every pending request with
    /// `Disconnected`. Later calls are no-ops. Returns the swept count.
    pub(crate) fn mark_disconnected(&self, reason: &str) -> usize {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == ChannelState::Disconnected {
                return 0;
            }
            *state = ChannelState::Disconnected;
        }
        let swept = self.correlator.close(AgentError::Disconnected);
        tracing::info!(session = self.id, swept, reason, "agent channel disconnected");
        swept
    }

    /// Disconnect and close our side of the stream so the agent sees EOF.
    /// Never waits for a write in progress: if one holds the writer, the
    /// stream closes when that write is abandoned and the session dropped.
    pub(crate) async fn shutdown(&self, reason: &str) -> usize {
        let swept = self.mark_disconnected(reason);
        let writer = match self.writer.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                tracing::debug!(session = self.id, "writer busy, leaving agent input open");
                None
            }
        };
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                tracing::debug!(session = self.id, "closing agent input: {}", e);
            }
        }
        swept
    }
}

/// Read frames until the stream ends or breaks; returns why it stopped.
/// Undecodable JSON bodies are skipped since framing stays intact.
async fn read_loop(mut reader: AgentReader, correlator: &Correlator) -> String {
    loop {
        match protocol::read_frame(&mut reader).await {
            Ok(Some(body)) => match serde_json::from_slice::<Value>(&body) {
                Ok(message) => {
                    correlator.dispatch(message);
                }
                Err(e) => tracing::warn!("skipping undecodable agent message: {}", e),
            },
            Ok(None) => return "agent closed the channel".to_string(),
            Err(FrameError::TooLarge { frame_bytes, .. }) => {
                return format!("oversized frame ({frame_bytes} bytes)")
            }
            Err(e) => return format!("read failed: {e}"),
        }
    }
}
