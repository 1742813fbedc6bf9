//! Terminal rendering of poller output.

use std::io::{self, Write};

use vidget_core::poller::ProgressView;
use vidget_core::task::Phase;

/// Line shown for a phase. In-progress lines start with `\r` so they
/// overwrite each other; terminal lines end the line.
pub fn phase_line(phase: &Phase) -> Option<String> {
    match phase {
        Phase::NotStarted => None,
        Phase::Requested => Some("\rwaiting...".to_string()),
        Phase::Downloading(p) => Some(format!("\r{p:>3}% downloading")),
        Phase::Merging => Some(format!("\r{:>3}% merging", vidget_core::task::MERGING_PERCENT)),
        Phase::Complete => Some("\r100% complete\n".to_string()),
        Phase::Failed(reason) => Some(format!("\rfailed: {reason}\n")),
    }
}

pub struct TerminalView<W: Write> {
    out: W,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = self.out.write_all(line.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!("progress output: {}", e);
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressView for TerminalView<W> {
    fn phase_changed(&mut self, phase: &Phase) {
        if let Some(line) = phase_line(phase) {
            self.emit(&line);
        }
    }

    fn reset_idle(&mut self) {
        self.emit("ready\n");
    }
}
