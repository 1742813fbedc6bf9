//! Durable front-end state: download path, first-run flag, referral timing.

mod download_path;
mod referral;
mod store;

pub use download_path::{DownloadPath, PathChange, PathError};
pub use referral::ReferralGate;
pub use store::{ClientState, ClientStateStore, StateError};
