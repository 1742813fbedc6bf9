//! Client-side download task and its presented phase.

use crate::protocol::{AgentRequest, MediaFormat, Quality};

/// Percent presented while the agent merges streams.
pub const MERGING_PERCENT: u8 = 99;

/// Presented lifecycle stage of one download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    /// The agent accepted the request; no progress reading yet.
    Requested,
    Downloading(u8),
    Merging,
    Complete,
    Failed(String),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Complete | Phase::Failed(_))
    }

    /// Percent shown for this phase, if it shows one.
    pub fn presented_percent(&self) -> Option<u8> {
        match self {
            Phase::Downloading(p) => Some(*p),
            Phase::Merging => Some(MERGING_PERCENT),
            Phase::Complete => Some(100),
            Phase::NotStarted | Phase::Requested | Phase::Failed(_) => None,
        }
    }
}

/// One download requested by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub target_url: String,
    pub format: MediaFormat,
    pub quality: Quality,
    pub destination_path: Option<String>,
    phase: Phase,
}

impl DownloadTask {
    pub fn new(
        target_url: impl Into<String>,
        format: MediaFormat,
        quality: Quality,
        destination_path: Option<String>,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            format,
            quality,
            destination_path,
            phase: Phase::NotStarted,
        }
    }

    /// Task for a download that is already running on the agent side (the
    /// `watch` flow): polling starts from `Requested`.
    pub fn attached() -> Self {
        let mut task = Self::new(String::new(), MediaFormat::default(), Quality::default(), None);
        task.phase = Phase::Requested;
        task
    }

    pub fn request(&self) -> AgentRequest {
        AgentRequest::Download {
            url: self.target_url.clone(),
            quality: self.quality,
            format: self.format,
            download_path: self.destination_path.clone(),
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The agent accepted the download request.
    pub fn mark_requested(&mut self) {
        if self.phase == Phase::NotStarted {
            self.phase = Phase::Requested;
        }
    }

    /// Set by the poller only. Returns true if the phase changed.
    pub(crate) fn set_phase(&mut self, phase: Phase) -> bool {
        if self.phase == phase {
            return false;
        }
        tracing::debug!(from = ?self.phase, to = ?phase, "download phase");
        self.phase = phase;
        true
    }
}
