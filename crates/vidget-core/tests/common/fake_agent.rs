//! In-memory agent reachable through a [`DuplexConnector`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use vidget_core::channel::{AgentConnector, AgentStream};
use vidget_core::error::AgentError;
use vidget_core::protocol::{self, CORRELATION_FIELD};

/// Agent side of one connection.
pub struct AgentEnd {
    reader: ReadHalf<DuplexStream>,
    writer: WriteHalf<DuplexStream>,
}

impl AgentEnd {
    /// Next request from the client, or None once the client closed its side.
    pub async fn recv(&mut self) -> Option<Value> {
        protocol::read_message(&mut self.reader).await.ok().flatten()
    }

    pub async fn reply(&mut self, message: Value) {
        protocol::write_message(&mut self.writer, &message)
            .await
            .expect("fake agent write");
    }

    /// Write bytes as they are, without framing.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("fake agent write");
        self.writer.flush().await.expect("fake agent flush");
    }
}

/// Hands each new connection to the test through [`AgentConnections`].
pub struct DuplexConnector {
    ends: mpsc::UnboundedSender<AgentEnd>,
    connects: Arc<AtomicUsize>,
}

impl AgentConnector for DuplexConnector {
    fn connect(&self) -> Result<AgentStream, AgentError> {
        let (client, agent) = tokio::io::duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (agent_read, agent_write) = tokio::io::split(agent);
        self.ends
            .send(AgentEnd {
                reader: agent_read,
                writer: agent_write,
            })
            .map_err(|_| AgentError::ConnectionUnavailable("fake agent gone".into()))?;
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(AgentStream::new(client_read, client_write))
    }
}

pub struct AgentConnections {
    ends: mpsc::UnboundedReceiver<AgentEnd>,
    connects: Arc<AtomicUsize>,
}

impl AgentConnections {
    pub async fn accept(&mut self) -> AgentEnd {
        self.ends.recv().await.expect("connector dropped")
    }

    /// Number of connections opened so far.
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn connect_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.connects)
    }
}

pub fn fake_agent() -> (DuplexConnector, AgentConnections) {
    let (tx, rx) = mpsc::unbounded_channel();
    let connects = Arc::new(AtomicUsize::new(0));
    (
        DuplexConnector {
            ends: tx,
            connects: Arc::clone(&connects),
        },
        AgentConnections {
            ends: rx,
            connects,
        },
    )
}

/// Answer every request on every connection with `handler`. The request's
/// correlation id, if any, is copied into the reply. `None` means no reply.
pub fn serve<F>(mut connections: AgentConnections, handler: F) -> JoinHandle<()>
where
    F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    tokio::spawn(async move {
        loop {
            let mut end = match connections.ends.recv().await {
                Some(end) => end,
                None => return,
            };
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                while let Some(request) = end.recv().await {
                    if let Some(mut reply) = handler(&request) {
                        if let (Some(id), Some(obj)) =
                            (request.get(CORRELATION_FIELD), reply.as_object_mut())
                        {
                            obj.insert(CORRELATION_FIELD.to_string(), id.clone());
                        }
                        end.reply(reply).await;
                    }
                }
            });
        }
    })
}

/// Connector for an agent that is not installed.
pub struct MissingAgent;

impl AgentConnector for MissingAgent {
    fn connect(&self) -> Result<AgentStream, AgentError> {
        Err(AgentError::AgentNotFound("vidget-agent".into()))
    }
}
