//! Iterative driver for [`PollMachine`].

use std::future::Future;

use super::machine::{PollMachine, PollStep};
use crate::channel::ChannelAdapter;
use crate::error::AgentError;
use crate::protocol::{AgentRequest, ProgressReport};
use crate::task::{DownloadTask, Phase};

/// Where progress readings come from.
pub trait StatusSource {
    fn query_progress(&self) -> impl Future<Output = Result<ProgressReport, AgentError>> + Send;
}

impl StatusSource for ChannelAdapter {
    fn query_progress(&self) -> impl Future<Output = Result<ProgressReport, AgentError>> + Send {
        async move {
            let reply = self.send_correlated(&AgentRequest::GetProgress).await?;
            Ok(ProgressReport::from_value(&reply))
        }
    }
}

/// Receives presented state: the starting phase once, then each change.
pub trait ProgressView {
    fn phase_changed(&mut self, phase: &Phase);
    /// The post-terminal delay has elapsed; the presentation returns to idle.
    fn reset_idle(&mut self);
}

/// Poll until the task reaches a terminal phase, then wait out the reset
/// delay. Queries are strictly sequential. Returns the terminal phase.
///
/// Dropping the returned future stops polling at its next suspension point.
pub async fn run_poll_loop<S, V>(
    source: &S,
    task: &mut DownloadTask,
    machine: &mut PollMachine,
    view: &mut V,
) -> Phase
where
    S: StatusSource + ?Sized,
    V: ProgressView + ?Sized,
{
    if *task.phase() != Phase::NotStarted {
        view.phase_changed(task.phase());
    }
    let mut delay = machine.timings().start_delay;
    let mut queries: u64 = 0;
    loop {
        tokio::time::sleep(delay).await;
        queries += 1;
        let before = task.phase().clone();
        let step = match source.query_progress().await {
            Ok(report) => machine.on_report(task, report),
            Err(err) => machine.on_query_error(task, &err),
        };
        if *task.phase() != before {
            view.phase_changed(task.phase());
        }
        match step {
            PollStep::QueryAfter(next) => delay = next,
            PollStep::Stop { reset_after } => {
                tracing::debug!(
                    queries,
                    reset_ms = reset_after.as_millis() as u64,
                    "polling finished"
                );
                tokio::time::sleep(reset_after).await;
                view.reset_idle();
                return task.phase().clone();
            }
        }
    }
}
