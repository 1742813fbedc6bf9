//! Download progress poller.
//!
//! [`PollMachine`] decides what each `getProgress` reading means for the task;
//! [`run_poll_loop`] owns the timers and issues the queries one at a time.

mod machine;
mod run;

pub use machine::{PollMachine, PollStep, PollTimings, UNRECOGNIZED_FAILURE_REASON};
pub use run::{run_poll_loop, ProgressView, StatusSource};
