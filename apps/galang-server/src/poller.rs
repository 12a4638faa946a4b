use chrono::Utc;
use galang_core::{Platform, PollReport, Result};
use serde::Serialize;
use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// What one pass of the background sweep did
#[derive(Debug, Clone, Serialize)]
pub struct Sweep {
    pub payments: PollReport,
    pub ended_campaigns: Vec<i32>,
}

/// Reconcile pending invoices with the gateway, then close campaigns past their deadline.
pub async fn sweep(platform: &Platform, batch: u64) -> Result<Sweep> {
    let payments = platform.donations.poll_pending(batch).await?;
    let ended_campaigns = platform.campaigns.end_expired(Utc::now()).await?;
    Ok(Sweep {
        payments,
        ended_campaigns,
    })
}

/// Run [`sweep`] every `period` until `shutdown` flips.
pub fn spawn_poller(
    platform: Platform,
    period: Duration,
    batch: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), batch, "Payment poller started");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match sweep(&platform, batch).await {
                        Ok(sweep) if sweep.payments.checked > 0 || !sweep.ended_campaigns.is_empty() => {
                            info!(
                                checked = sweep.payments.checked,
                                credited = sweep.payments.credited,
                                expired = sweep.payments.expired,
                                failed = sweep.payments.failed,
                                ended = sweep.ended_campaigns.len(),
                                "Sweep finished"
                            );
                        }
                        Ok(_) => debug!("Sweep found nothing to do"),
                        Err(e) => warn!("Sweep failed: {e}"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Payment poller stopped");
    })
}
