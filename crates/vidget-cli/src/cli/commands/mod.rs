//! CLI command handlers. Each command is in its own file.

mod completions;
mod download;
mod path;
mod ping;
mod watch;

pub use completions::{run_completions, run_man};
pub use download::run_download;
pub use path::run_path;
pub use ping::run_ping;
pub use watch::run_watch;
