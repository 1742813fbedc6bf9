//! CLI for the vidget media download front end.

mod commands;
mod render;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vidget_core::channel::{ChannelAdapter, ProcessConnector};
use vidget_core::client_state::ClientStateStore;
use vidget_core::config::{self, VidgetConfig};
use vidget_core::protocol::{MediaFormat, Quality};

use commands::{run_completions, run_download, run_man, run_path, run_ping, run_watch};

/// Top-level CLI for vidget.
#[derive(Debug, Parser)]
#[command(name = "vidget")]
#[command(about = "vidget: request media downloads from the local agent and follow their progress", long_about = None)]
pub struct Cli {
    /// Agent executable to use instead of `agent_program` from config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub agent: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Ask the agent to download a video (or its audio) and follow progress.
    Download {
        /// Page URL: a YouTube watch/shorts/youtu.be link or any other http(s) page.
        url: String,
        /// Output kind: video or audio.
        #[arg(long, short, default_value = "video")]
        format: MediaFormat,
        /// Video quality ceiling: best or 720.
        #[arg(long, short, default_value = "best")]
        quality: Quality,
    },

    /// Show the download directory, or pick a new one.
    Path {
        /// Open the agent's directory picker and store the selection.
        #[arg(long)]
        change: bool,
    },

    /// Follow the progress of the download the agent is currently running.
    Watch,

    /// Check that the agent is installed and answering.
    Ping,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },

    /// Print the man page.
    Man,
}

/// What every agent-facing command works with.
pub(crate) struct Frontend {
    pub cfg: VidgetConfig,
    pub adapter: ChannelAdapter,
    pub store: ClientStateStore,
}

impl Frontend {
    fn open(agent_override: Option<PathBuf>) -> Result<Self> {
        let mut cfg = config::load_or_init().context("load config")?;
        if let Some(agent) = agent_override {
            cfg.agent_program = agent;
        }
        tracing::debug!("loaded config: {:?}", cfg);
        let connector = ProcessConnector::new(cfg.agent_program.clone(), cfg.agent_args.clone());
        let adapter = ChannelAdapter::new(connector, cfg.channel_timeouts());
        let store = ClientStateStore::open_default().context("locate client state")?;
        Ok(Self {
            cfg,
            adapter,
            store,
        })
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        let frontend = match cli.command {
            CliCommand::Completions { shell } => return run_completions(shell),
            CliCommand::Man => return run_man(),
            _ => Frontend::open(cli.agent)?,
        };

        let result = match cli.command {
            CliCommand::Download {
                url,
                format,
                quality,
            } => run_download(&frontend, &url, format, quality).await,
            CliCommand::Path { change } => run_path(&frontend, change).await,
            CliCommand::Watch => run_watch(&frontend).await,
            CliCommand::Ping => run_ping(&frontend).await,
            CliCommand::Completions { .. } | CliCommand::Man => Ok(()),
        };

        let swept = frontend.adapter.disconnect().await;
        if swept > 0 {
            tracing::debug!(swept, "requests still pending at exit");
        }
        result
    }
}

#[cfg(test)]
mod tests;
