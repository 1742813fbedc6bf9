//! User-facing failure messages.

use std::time::Duration;

use vidget_core::error::AgentError;

/// Pause after a failure before the command returns, so the message is read
/// before another attempt can start.
pub const REARM_DELAY: Duration = Duration::from_millis(2000);

const INSTALL_HINT: &str = "the vidget agent is not installed; install it and make sure it is on your PATH \
                            (or set agent_program in ~/.config/vidget/config.toml)";
const GENERIC_FAILURE: &str = "something went wrong talking to the agent; please try again";

pub fn user_message(err: &AgentError) -> &'static str {
    if err.is_not_found() {
        INSTALL_HINT
    } else {
        GENERIC_FAILURE
    }
}

/// Log `err`, tell the user, wait out the re-arm delay, and hand back the
/// error for the caller to return.
pub async fn agent_failure(err: &AgentError) -> anyhow::Error {
    tracing::warn!("agent request failed: {}", err);
    let message = user_message(err);
    eprintln!("{message}");
    tokio::time::sleep(REARM_DELAY).await;
    anyhow::Error::new(err.clone()).context(message)
}
