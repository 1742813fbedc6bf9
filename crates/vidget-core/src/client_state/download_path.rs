//! The destination directory for downloads.
//!
//! Fetched from the agent (`getPath`) the first time it is needed, persisted,
//! and from then on read from client state without asking the agent. Only the
//! explicit change flow (`selectPath`) replaces it.

use thiserror::Error;

use super::store::{ClientStateStore, StateError};
use crate::channel::ChannelAdapter;
use crate::error::AgentError;
use crate::protocol::{AgentRequest, PathReply};

#[derive(Debug, Error)]
pub enum PathError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    State(#[from] StateError),
}

/// Result of the path-change flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathChange {
    Changed(String),
    /// The user dismissed the dialog; the previous path (if any) stays.
    Kept(Option<String>),
}

#[derive(Debug)]
pub struct DownloadPath {
    store: ClientStateStore,
    cached: Option<String>,
}

impl DownloadPath {
    pub fn new(store: ClientStateStore) -> Self {
        Self {
            store,
            cached: None,
        }
    }

    /// The known path, from memory or client state. Never contacts the agent.
    pub fn known(&mut self) -> Result<Option<String>, StateError> {
        if self.cached.is_none() {
            self.cached = self.store.load()?.download_path;
        }
        Ok(self.cached.clone())
    }

    /// The known path, or the agent's default fetched once and persisted.
    pub async fn resolve(&mut self, adapter: &ChannelAdapter) -> Result<String, PathError> {
        if let Some(path) = self.known()? {
            return Ok(path);
        }
        let reply = adapter.send_one_shot(&AgentRequest::GetPath).await?;
        let path = PathReply::from_value(&reply)?.path.ok_or_else(|| {
            AgentError::MalformedResponse("getPath reply without a path".to_string())
        })?;
        tracing::info!(path = %path, "download path fetched from agent");
        self.persist(path.clone())?;
        Ok(path)
    }

    /// Ask the agent to let the user pick a new directory.
    pub async fn change(&mut self, adapter: &ChannelAdapter) -> Result<PathChange, PathError> {
        let reply = adapter.send_correlated(&AgentRequest::SelectPath).await?;
        let reply = PathReply::from_value(&reply)?;
        match reply.path {
            Some(path) if !reply.cancelled => {
                tracing::info!(path = %path, "download path changed");
                self.persist(path.clone())?;
                Ok(PathChange::Changed(path))
            }
            _ => {
                tracing::debug!("path selection cancelled");
                Ok(PathChange::Kept(self.known()?))
            }
        }
    }

    /// Persist first, then cache: the path is on disk before anything uses it.
    fn persist(&mut self, path: String) -> Result<(), StateError> {
        self.store.update(|s| s.download_path = Some(path.clone()))?;
        self.cached = Some(path);
        Ok(())
    }
}
