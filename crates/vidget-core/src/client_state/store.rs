//! Persist client state to disk (JSON under XDG state dir) so it survives across runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("locate state directory: {0}")]
    Location(#[from] xdg::BaseDirectoriesError),
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse client state {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize client state: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Durable key/value state of the front end. Missing keys read as defaults;
/// unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    pub first_run_acknowledged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_last_shown_ms: Option<i64>,
}

/// Location of the client state file. Every read goes to disk, so state
/// written by an earlier process (or another command) is always seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientStateStore {
    path: PathBuf,
}

impl ClientStateStore {
    /// Default path: `~/.local/state/vidget/client_state.json`.
    pub fn default_path() -> Result<PathBuf, StateError> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("vidget")?;
        Ok(xdg_dirs
            .get_state_home()
            .join("vidget")
            .join("client_state.json"))
    }

    pub fn open_default() -> Result<Self, StateError> {
        Ok(Self::at(Self::default_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state; a missing file is an empty state.
    pub fn load(&self) -> Result<ClientState, StateError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ClientState::default()),
            Err(source) => {
                return Err(StateError::Io {
                    op: "read",
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the state (creates parent dir if needed).
    pub fn save(&self, state: &ClientState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StateError::Io {
                op: "create dir",
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(state).map_err(StateError::Serialize)?;
        std::fs::write(&self.path, json).map_err(|source| StateError::Io {
            op: "write",
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "client state saved");
        Ok(())
    }

    /// Load, apply `change`, save. Returns the saved state.
    pub fn update(&self, change: impl FnOnce(&mut ClientState)) -> Result<ClientState, StateError> {
        let mut state = self.load()?;
        change(&mut state);
        self.save(&state)?;
        Ok(state)
    }

    /// True the first time it is called for this state file; the
    /// acknowledgement is persisted before returning.
    pub fn acknowledge_first_run(&self) -> Result<bool, StateError> {
        let state = self.load()?;
        if state.first_run_acknowledged {
            return Ok(false);
        }
        self.update(|s| s.first_run_acknowledged = true)?;
        Ok(true)
    }
}
