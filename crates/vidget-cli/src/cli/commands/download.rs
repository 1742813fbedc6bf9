//! `vidget download <url>` – request a download and follow its progress.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use vidget_core::client_state::{DownloadPath, PathError, ReferralGate};
use vidget_core::protocol::{DownloadAck, MediaFormat, Quality};
use vidget_core::task::DownloadTask;
use vidget_core::url_model::SourceUrl;

use super::watch::follow;
use crate::cli::report;
use crate::cli::Frontend;

const FIRST_RUN_NOTICE: &str = "vidget hands downloads to the local agent; files land in the \
                                download directory shown by `vidget path`.";

pub async fn run_download(
    frontend: &Frontend,
    url: &str,
    format: MediaFormat,
    quality: Quality,
) -> Result<()> {
    let source = SourceUrl::parse(url)?;

    if frontend
        .store
        .acknowledge_first_run()
        .context("record first run")?
    {
        println!("{FIRST_RUN_NOTICE}");
    }

    // Without a stored path the agent falls back to its own default.
    let destination = match DownloadPath::new(frontend.store.clone())
        .resolve(&frontend.adapter)
        .await
    {
        Ok(dir) => Some(dir),
        Err(PathError::Agent(err)) if err.is_not_found() => {
            return Err(report::agent_failure(&err).await)
        }
        Err(err) => {
            tracing::warn!("download path unavailable, using the agent default: {}", err);
            None
        }
    };

    let mut task = DownloadTask::new(source.to_request_url(), format, quality, destination);
    tracing::info!(
        url = %task.target_url,
        platform = source.platform(),
        media = ?format,
        quality = ?quality,
        "requesting download"
    );
    let ack = match frontend.adapter.send_one_shot(&task.request()).await {
        Ok(value) => DownloadAck::from_value(value),
        Err(err) => Err(err),
    };
    let ack = match ack {
        Ok(ack) => ack,
        Err(err) => return Err(report::agent_failure(&err).await),
    };
    task.mark_requested();
    match ack.path.as_deref() {
        Some(dir) => println!("Download started ({}) into {dir}", source.platform()),
        None => println!("Download started ({})", source.platform()),
    }

    show_referral(frontend);
    follow(frontend, &mut task).await
}

fn show_referral(frontend: &Frontend) {
    let gate = ReferralGate::from_config(&frontend.cfg.referral);
    match gate.take_due(&frontend.store, now_ms()) {
        Ok(Some(link)) => println!("Enjoying vidget? {link}"),
        Ok(None) => {}
        Err(e) => tracing::warn!("referral state: {}", e),
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
