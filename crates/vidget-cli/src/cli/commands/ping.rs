//! `vidget ping` – check that the agent is installed and answering.

use anyhow::Result;
use vidget_core::protocol::{AgentRequest, PingReply};

use crate::cli::report;
use crate::cli::Frontend;

pub async fn run_ping(frontend: &Frontend) -> Result<()> {
    let reply = match frontend.adapter.send_one_shot(&AgentRequest::Ping).await {
        Ok(value) => PingReply::from_value(value),
        Err(err) => Err(err),
    };
    match reply {
        Ok(reply) => {
            println!(
                "Agent {} (version {})",
                reply.status,
                reply.version.as_deref().unwrap_or("unknown")
            );
            Ok(())
        }
        Err(err) => Err(report::agent_failure(&err).await),
    }
}
