//! `vidget path [--change]` – show the download directory, or pick a new one.

use anyhow::Result;
use vidget_core::client_state::{DownloadPath, PathChange, PathError};

use crate::cli::report;
use crate::cli::Frontend;

pub async fn run_path(frontend: &Frontend, change: bool) -> Result<()> {
    let mut path = DownloadPath::new(frontend.store.clone());
    if !change {
        return match path.resolve(&frontend.adapter).await {
            Ok(dir) => {
                println!("{dir}");
                Ok(())
            }
            Err(err) => Err(path_failure(err).await),
        };
    }

    match path.change(&frontend.adapter).await {
        Ok(PathChange::Changed(dir)) => println!("Download path set to {dir}"),
        Ok(PathChange::Kept(Some(dir))) => println!("Selection cancelled; keeping {dir}"),
        Ok(PathChange::Kept(None)) => println!("Selection cancelled."),
        Err(err) => return Err(path_failure(err).await),
    }
    Ok(())
}

async fn path_failure(err: PathError) -> anyhow::Error {
    match err {
        PathError::Agent(err) => report::agent_failure(&err).await,
        PathError::State(err) => anyhow::Error::new(err).context("download path"),
    }
}
