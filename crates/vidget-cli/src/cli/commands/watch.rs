//! `vidget watch` – follow the download the agent is already running.

use anyhow::{bail, Result};
use vidget_core::poller::{run_poll_loop, PollMachine};
use vidget_core::task::{DownloadTask, Phase};

use crate::cli::render::TerminalView;
use crate::cli::Frontend;

pub async fn run_watch(frontend: &Frontend) -> Result<()> {
    let mut task = DownloadTask::attached();
    follow(frontend, &mut task).await
}

/// Poll `task` to a terminal phase, rendering to stdout.
pub(super) async fn follow(frontend: &Frontend, task: &mut DownloadTask) -> Result<()> {
    let poll = &frontend.cfg.poll;
    let mut machine = PollMachine::new(poll.timings()).with_max_unrecognized(poll.max_unrecognized_polls);
    let mut view = TerminalView::stdout();
    match run_poll_loop(&frontend.adapter, task, &mut machine, &mut view).await {
        Phase::Failed(reason) => bail!("download failed: {reason}"),
        _ => Ok(()),
    }
}
