//! Requests sent to the agent and correlation-id stamping.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field injected into correlated requests and echoed back by the agent.
pub const CORRELATION_FIELD: &str = "_id";

/// Container kind the agent should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    #[default]
    Video,
    Audio,
}

/// Quality ceiling for video downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    #[serde(rename = "best")]
    Best,
    #[serde(rename = "720")]
    Hd720,
}

impl std::str::FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(MediaFormat::Video),
            "audio" | "mp3" => Ok(MediaFormat::Audio),
            other => Err(format!("unknown format '{other}' (expected video or audio)")),
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "best" => Ok(Quality::Best),
            "720" | "720p" => Ok(Quality::Hd720),
            other => Err(format!("unknown quality '{other}' (expected best or 720)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AgentRequest {
    Download {
        url: String,
        quality: Quality,
        format: MediaFormat,
        #[serde(rename = "downloadPath", skip_serializing_if = "Option::is_none")]
        download_path: Option<String>,
    },
    GetProgress,
    GetPath,
    SelectPath,
    Ping,
}

impl AgentRequest {
    /// Wire name of the action, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            AgentRequest::Download { .. } => "download",
            AgentRequest::GetProgress => "getProgress",
            AgentRequest::GetPath => "getPath",
            AgentRequest::SelectPath => "selectPath",
            AgentRequest::Ping => "ping",
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Stamp `id` onto an outgoing message object. Non-object messages are left
/// untouched; every `AgentRequest` serializes to an object.
pub fn stamp_correlation_id(message: &mut Value, id: u64) {
    if let Value::Object(map) = message {
        map.insert(CORRELATION_FIELD.to_string(), Value::from(id));
    }
}

/// Read the correlation id echoed on an inbound message, if any. Accepts the
/// number we sent or its decimal string form.
pub fn correlation_id(message: &Value) -> Option<u64> {
    match message.get(CORRELATION_FIELD)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
