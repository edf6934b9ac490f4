//! # Sync Scheduler
//!
//! Background loop that runs a sync callback on a fixed interval until
//! shut down. Two guarantees keep it boring:
//!
//! - **Cancellation**: `shutdown` flips a watch channel the loop selects
//!   on, then awaits the task, so no tick can start after shutdown
//!   returns.
//! - **Same-minute idempotence**: each firing is keyed by the wall-clock
//!   minute; a second tick landing in the same minute is skipped. Missed
//!   ticks after a laptop sleep collapse into one run instead of a burst.
//!
//! A failing tick is logged and the loop keeps going; transient network
//! errors must not kill auto-sync for the rest of the session.

use anyhow::Result;
use chrono::{DateTime, Local};
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running scheduler loop
pub struct SyncScheduler {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Wall-clock minute key, e.g. `2024-03-01T08:05`
pub fn minute_key(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M").to_string()
}

/// Whether a tick at `now` should run given the last fired minute
pub fn should_fire(last_fired: Option<&str>, now: &str) -> bool {
    last_fired != Some(now)
}

/// Tick interval for a settings value, clamped to at least one minute
pub fn interval_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.max(1) * 60)
}

impl SyncScheduler {
    /// Spawn the loop. The first tick fires immediately, then every
    /// `interval` (subject to the minute dedup).
    pub fn start<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut last_fired: Option<String> = None;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let now = minute_key(&Local::now());
                        if !should_fire(last_fired.as_deref(), &now) {
                            debug!("Skipping duplicate sync tick for {}", now);
                            continue;
                        }
                        // Mark before running so a failing tick is not
                        // retried in a tight loop
                        last_fired = Some(now);

                        if let Err(e) = tick().await {
                            warn!("⚠️ Scheduled sync failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Sync scheduler shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stop the loop and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.handle.await;
    }
}
