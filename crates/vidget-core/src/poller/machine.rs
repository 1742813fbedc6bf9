//! Transition table of the progress poller.
//!
//! The machine is pure: it takes one reading (or one query failure), updates
//! the task phase, and says when to query next or how long to wait before
//! resetting to idle. Timers live in the driver.

use std::time::Duration;

use crate::error::AgentError;
use crate::protocol::ProgressReport;
use crate::retry::{self, RetryDecision, RetryPolicy};
use crate::task::{DownloadTask, Phase};

/// Reason used when the agent keeps answering with statuses we do not know.
pub const UNRECOGNIZED_FAILURE_REASON: &str = "unrecognized agent response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTimings {
    /// Delay before the first query, giving the agent time to begin.
    pub start_delay: Duration,
    /// Steady-state interval between queries.
    pub interval: Duration,
    /// Interval after a failed query.
    pub error_backoff: Duration,
    /// Delay between `Complete` and the idle reset.
    pub complete_reset: Duration,
    /// Delay between `Failed` and the idle reset.
    pub failed_reset: Duration,
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(500),
            interval: Duration::from_millis(500),
            error_backoff: Duration::from_millis(1000),
            complete_reset: Duration::from_millis(2000),
            failed_reset: Duration::from_millis(3000),
        }
    }
}

/// What the driver does after a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Query again after the delay.
    QueryAfter(Duration),
    /// Terminal phase reached: stop querying, reset to idle after the delay.
    Stop { reset_after: Duration },
}

#[derive(Debug, Clone)]
pub struct PollMachine {
    timings: PollTimings,
    retry: RetryPolicy,
    max_unrecognized: Option<u32>,
    unrecognized_streak: u32,
}

impl PollMachine {
    pub fn new(timings: PollTimings) -> Self {
        Self {
            timings,
            retry: RetryPolicy {
                delay: timings.error_backoff,
            },
            max_unrecognized: None,
            unrecognized_streak: 0,
        }
    }

    /// Give up after this many consecutive unrecognized readings instead of
    /// polling forever.
    pub fn with_max_unrecognized(mut self, limit: Option<u32>) -> Self {
        self.max_unrecognized = limit;
        self
    }

    pub fn timings(&self) -> &PollTimings {
        &self.timings
    }

    pub fn on_report(&mut self, task: &mut DownloadTask, report: ProgressReport) -> PollStep {
        if !matches!(report, ProgressReport::Unrecognized { .. }) {
            self.unrecognized_streak = 0;
        }
        match report {
            ProgressReport::Downloading { percent } => {
                task.set_phase(Phase::Downloading(percent));
                PollStep::QueryAfter(self.timings.interval)
            }
            ProgressReport::Merging => {
                task.set_phase(Phase::Merging);
                PollStep::QueryAfter(self.timings.interval)
            }
            ProgressReport::Complete { title } => {
                tracing::info!(title = title.as_deref().unwrap_or(""), "download complete");
                self.finish(task, Phase::Complete)
            }
            ProgressReport::Failed { reason } => {
                tracing::warn!(reason = %reason, "agent reported download failure");
                self.finish(task, Phase::Failed(reason))
            }
            ProgressReport::Unrecognized { status } => {
                self.unrecognized_streak = self.unrecognized_streak.saturating_add(1);
                tracing::debug!(
                    status = status.as_deref().unwrap_or("<absent>"),
                    streak = self.unrecognized_streak,
                    "unrecognized progress status"
                );
                match self.max_unrecognized {
                    Some(limit) if self.unrecognized_streak >= limit => {
                        tracing::warn!(limit, "giving up on unrecognized progress statuses");
                        self.finish(task, Phase::Failed(UNRECOGNIZED_FAILURE_REASON.to_string()))
                    }
                    _ => PollStep::QueryAfter(self.timings.interval),
                }
            }
        }
    }

    /// A query failed before producing a reading. The phase is left alone
    /// unless the agent itself reported the error.
    pub fn on_query_error(&mut self, task: &mut DownloadTask, err: &AgentError) -> PollStep {
        let kind = retry::classify(err);
        match self.retry.decide(kind) {
            RetryDecision::RetryAfter(delay) => {
                tracing::debug!(?kind, "progress query failed, retrying: {}", err);
                PollStep::QueryAfter(delay)
            }
            RetryDecision::NoRetry => {
                tracing::warn!(?kind, "progress query failed: {}", err);
                self.finish(task, Phase::Failed(err.to_string()))
            }
        }
    }

    fn finish(&mut self, task: &mut DownloadTask, phase: Phase) -> PollStep {
        let reset_after = match phase {
            Phase::Complete => self.timings.complete_reset,
            _ => self.timings.failed_reset,
        };
        task.set_phase(phase);
        PollStep::Stop { reset_after }
    }
}
