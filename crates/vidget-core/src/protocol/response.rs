//! Typed views over agent replies.
//!
//! Replies are decoded defensively from `serde_json::Value`: the agent is
//! loosely typed, so unknown progress statuses become
//! [`ProgressReport::Unrecognized`] instead of being folded into a known one.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AgentError;

/// Fallback reason when the agent reports failure without saying why.
pub const DEFAULT_FAILURE_REASON: &str = "download failed";

/// Reply to `download`: accepted or rejected. Progress is polled separately.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DownloadAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl DownloadAck {
    /// Decode and turn a rejection into `AgentReported`.
    pub fn from_value(value: Value) -> Result<Self, AgentError> {
        let ack: DownloadAck = serde_json::from_value(value)
            .map_err(|e| AgentError::MalformedResponse(format!("download reply: {e}")))?;
        if ack.success {
            Ok(ack)
        } else {
            Err(AgentError::AgentReported(
                ack.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            ))
        }
    }
}

/// One reading of `getProgress`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressReport {
    Downloading { percent: u8 },
    Merging,
    Complete { title: Option<String> },
    Failed { reason: String },
    /// Status absent or not one we know (e.g. the agent's `waiting`/`starting`).
    Unrecognized { status: Option<String> },
}

impl ProgressReport {
    pub fn from_value(value: &Value) -> Self {
        let status = value.get("status").and_then(Value::as_str);
        match status {
            Some("downloading") => ProgressReport::Downloading {
                percent: percent_field(value),
            },
            Some("merging") => ProgressReport::Merging,
            Some("complete") => ProgressReport::Complete {
                title: non_empty_str(value, "title"),
            },
            Some("error") => ProgressReport::Failed {
                reason: non_empty_str(value, "error")
                    .unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string()),
            },
            other => ProgressReport::Unrecognized {
                status: other.map(str::to_string),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressReport::Complete { .. } | ProgressReport::Failed { .. }
        )
    }
}

/// Missing or non-numeric percent reads as 0; values are clamped into 0..=100.
fn percent_field(value: &Value) -> u8 {
    value
        .get("percent")
        .and_then(Value::as_f64)
        .map(|p| p.clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reply to `getPath` / `selectPath`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathReply {
    pub path: Option<String>,
    pub cancelled: bool,
}

impl PathReply {
    pub fn from_value(value: &Value) -> Result<Self, AgentError> {
        if let Some(err) = non_empty_str(value, "error") {
            return Err(AgentError::AgentReported(err));
        }
        let path = non_empty_str(value, "path");
        let cancelled = value
            .get("cancelled")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if path.is_none() && !cancelled {
            return Err(AgentError::MalformedResponse(
                "path reply without a path".to_string(),
            ));
        }
        Ok(PathReply { path, cancelled })
    }
}

/// Reply to `ping`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PingReply {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl PingReply {
    pub fn from_value(value: Value) -> Result<Self, AgentError> {
        if let Some(err) = non_empty_str(&value, "error") {
            return Err(AgentError::AgentReported(err));
        }
        serde_json::from_value(value)
            .map_err(|e| AgentError::MalformedResponse(format!("ping reply: {e}")))
    }
}
