//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod fake_agent;

use tokio::time::Instant;
use vidget_core::poller::ProgressView;
use vidget_core::task::Phase;

/// Records every rendered phase and when the idle reset happened.
#[derive(Default)]
pub struct RecordingView {
    pub phases: Vec<Phase>,
    pub reset_at: Option<Instant>,
}

impl ProgressView for RecordingView {
    fn phase_changed(&mut self, phase: &Phase) {
        self.phases.push(phase.clone());
    }

    fn reset_idle(&mut self) {
        self.reset_at = Some(Instant::now());
    }
}
