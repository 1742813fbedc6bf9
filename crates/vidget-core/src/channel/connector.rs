//! Opening a duplex byte stream to the agent.
//!
//! The production connector spawns the agent executable and talks over its
//! stdio, the way a browser launches a native-messaging host. Tests plug in an
//! in-memory connector instead.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};

use crate::error::AgentError;

pub type AgentReader = Box<dyn AsyncRead + Send + Unpin>;
pub type AgentWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One open connection: the agent's output, its input, and the process behind
/// them when there is one.
pub struct AgentStream {
    pub reader: AgentReader,
    pub writer: AgentWriter,
    pub child: Option<Child>,
}

impl AgentStream {
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
        }
    }
}

impl std::fmt::Debug for AgentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentStream")
            .field("pid", &self.child.as_ref().and_then(Child::id))
            .finish_non_exhaustive()
    }
}

/// Source of agent connections. `connect` is synchronous: starting a process
/// or wiring an in-memory pipe never needs to suspend.
pub trait AgentConnector: Send + Sync {
    fn connect(&self) -> Result<AgentStream, AgentError>;
}

/// Spawns the agent executable with piped stdin/stdout.
#[derive(Debug, Clone)]
pub struct ProcessConnector {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessConnector {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl AgentConnector for ProcessConnector {
    fn connect(&self) -> Result<AgentStream, AgentError> {
        let program = self.program.display().to_string();
        // The agent may outlive its stdin (a started download keeps running), so
        // the child is never killed on drop; it is reaped in the background.
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| AgentError::from_spawn(&program, &e))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            AgentError::ConnectionUnavailable(format!("{program}: stdin not captured"))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            AgentError::ConnectionUnavailable(format!("{program}: stdout not captured"))
        })?;
        tracing::debug!(program = %program, pid = ?child.id(), "spawned agent");

        Ok(AgentStream {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
            child: Some(child),
        })
    }
}

/// Wait for an agent process in the background so it does not linger as a zombie.
pub(crate) fn reap(child: Option<Child>) {
    if let Some(mut child) = child {
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::debug!(%status, "agent process exited"),
                Err(e) => tracing::debug!("agent process wait: {}", e),
            }
        });
    }
}
