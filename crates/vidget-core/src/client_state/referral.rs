//! Time gate for the referral link printed after an accepted download.

use std::time::Duration;

use super::store::{ClientStateStore, StateError};
use crate::config::ReferralConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralGate {
    url: Option<String>,
    min_interval: Duration,
}

impl ReferralGate {
    pub fn new(url: Option<String>, min_interval: Duration) -> Self {
        Self { url, min_interval }
    }

    pub fn from_config(cfg: &ReferralConfig) -> Self {
        Self::new(
            cfg.url.clone(),
            Duration::from_secs(cfg.min_interval_hours.saturating_mul(3600)),
        )
    }

    /// The link to show now, if one is configured and strictly more than the
    /// interval has passed since the last showing. The showing time is persisted before the link
    /// is returned, so a crash afterwards cannot show it twice.
    pub fn take_due(&self, store: &ClientStateStore, now_ms: i64) -> Result<Option<String>, StateError> {
        let Some(url) = self.url.as_ref() else {
            return Ok(None);
        };
        let interval_ms = i64::try_from(self.min_interval.as_millis()).unwrap_or(i64::MAX);
        if let Some(last) = store.load()?.referral_last_shown_ms {
            if now_ms.saturating_sub(last) <= interval_ms {
                return Ok(None);
            }
        }
        store.update(|s| s.referral_last_shown_ms = Some(now_ms))?;
        Ok(Some(url.clone()))
    }
}
