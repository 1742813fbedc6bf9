use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::channel::{ChannelTimeouts, DEFAULT_REQUEST_TIMEOUT};
use crate::poller::PollTimings;

/// Poller timings in milliseconds (optional `[poll]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay before the first progress query after the agent accepted a download.
    pub start_delay_ms: u64,
    /// Interval between progress queries.
    pub interval_ms: u64,
    /// Interval after a failed progress query.
    pub error_backoff_ms: u64,
    /// How long "complete" stays on screen before the idle reset.
    pub complete_reset_ms: u64,
    /// How long a failure stays on screen before the idle reset.
    pub failed_reset_ms: u64,
    /// Give up after this many consecutive unknown statuses (None = keep polling).
    pub max_unrecognized_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 500,
            interval_ms: 500,
            error_backoff_ms: 1000,
            complete_reset_ms: 2000,
            failed_reset_ms: 3000,
            max_unrecognized_polls: None,
        }
    }
}

impl PollConfig {
    pub fn timings(&self) -> PollTimings {
        PollTimings {
            start_delay: Duration::from_millis(self.start_delay_ms),
            interval: Duration::from_millis(self.interval_ms),
            error_backoff: Duration::from_millis(self.error_backoff_ms),
            complete_reset: Duration::from_millis(self.complete_reset_ms),
            failed_reset: Duration::from_millis(self.failed_reset_ms),
        }
    }
}

/// Referral link shown after accepted downloads, at most once per interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferralConfig {
    /// Link to show. Unset disables the referral entirely.
    pub url: Option<String>,
    /// Minimum hours between two showings.
    pub min_interval_hours: u64,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            url: None,
            min_interval_hours: 8,
        }
    }
}

/// Global configuration loaded from `~/.config/vidget/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VidgetConfig {
    /// Agent executable, looked up on PATH when not absolute.
    pub agent_program: PathBuf,
    /// Extra arguments passed to the agent.
    pub agent_args: Vec<String>,
    /// Deadline for each request on the persistent channel.
    pub request_timeout_secs: u64,
    /// Optional deadline for one-shot requests (None = wait for the agent).
    pub one_shot_timeout_secs: Option<u64>,
    pub poll: PollConfig,
    pub referral: ReferralConfig,
}

impl Default for VidgetConfig {
    fn default() -> Self {
        Self {
            agent_program: PathBuf::from("vidget-agent"),
            agent_args: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            one_shot_timeout_secs: None,
            poll: PollConfig::default(),
            referral: ReferralConfig::default(),
        }
    }
}

impl VidgetConfig {
    pub fn channel_timeouts(&self) -> ChannelTimeouts {
        ChannelTimeouts {
            request: Duration::from_secs(self.request_timeout_secs),
            one_shot: self.one_shot_timeout_secs.map(Duration::from_secs),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vidget")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VidgetConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VidgetConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VidgetConfig = toml::from_str(&data)?;
    Ok(cfg)
}
