pub mod config;
pub mod logging;

pub mod channel;
pub mod client_state;
pub mod error;
pub mod poller;
pub mod protocol;
pub mod retry;
pub mod task;
pub mod url_model;
