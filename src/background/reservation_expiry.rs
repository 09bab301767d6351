//! Daily release of reservations that were never approved.
//!
//! Once per day, at a fixed UTC time of day, every book reserved longer ago
//! than the configured expiry goes back to `available`.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use crate::services::lifecycle::LifecycleService;

pub struct ReservationSweeper {
    lifecycle: LifecycleService,
    sweep_at: NaiveTime,
    sweep_on_startup: bool,
}

/// First occurrence of `at` (UTC) strictly after `now`
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(at));
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

impl ReservationSweeper {
    pub fn new(lifecycle: LifecycleService, sweep_at: NaiveTime, sweep_on_startup: bool) -> Self {
        Self {
            lifecycle,
            sweep_at,
            sweep_on_startup,
        }
    }

    /// Run a single sweep as of `now`. Failures are logged and left for the next run.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Option<u64> {
        match self.lifecycle.release_expired_reservations(now).await {
            Ok(released) => {
                if released > 0 {
                    tracing::info!(released, "Reservation expiry: released stale reservations");
                } else {
                    tracing::debug!("Reservation expiry: nothing to release");
                }
                Some(released)
            }
            Err(e) => {
                tracing::error!(error = %e, "Reservation expiry: sweep failed");
                None
            }
        }
    }

    /// Run the sweep loop until `cancel` is triggered
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            sweep_at = %self.sweep_at,
            expiry_days = self.lifecycle.expiry().num_days(),
            "Reservation expiry job started"
        );

        if self.sweep_on_startup && !cancel.is_cancelled() {
            self.sweep_once(Utc::now()).await;
        }

        loop {
            let now = Utc::now();
            let next = next_run_after(now, self.sweep_at);
            let wait = (next - now).to_std().unwrap_or_default();
            tracing::debug!(next_run = %next, "Reservation expiry scheduled");

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Reservation expiry job stopping");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    self.sweep_once(Utc::now()).await;
                }
            }
        }
    }
}
