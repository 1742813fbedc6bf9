//! Throwaway request/response exchange on a fresh connection.

use serde_json::Value;

use super::connector::{reap, AgentStream};
use crate::error::AgentError;
use crate::protocol::{self, AgentRequest, FrameError};

/// Send `request`, read exactly one reply, then close our side. The agent
/// process is left to finish on its own.
pub(super) async fn exchange(stream: AgentStream, request: &AgentRequest) -> Result<Value, AgentError> {
    let AgentStream {
        mut reader,
        mut writer,
        child,
    } = stream;

    let result = async {
        protocol::write_message(&mut writer, request)
            .await
            .map_err(|e| AgentError::TransportFault(e.to_string()))?;
        match protocol::read_message(&mut reader).await {
            Ok(Some(reply)) => Ok(reply),
            Ok(None) => Err(AgentError::Disconnected),
            Err(FrameError::Io(e)) => {
                tracing::debug!("one-shot read failed: {}", e);
                Err(AgentError::Disconnected)
            }
            Err(e) => Err(AgentError::MalformedResponse(e.to_string())),
        }
    }
    .await;

    drop(writer);
    drop(reader);
    reap(child);
    result
}
