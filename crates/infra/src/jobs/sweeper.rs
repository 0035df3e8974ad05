//! Retention sweeper: periodically evicts jobs that outlived the retention window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::store::{JobStore, JobStoreError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    #[error("retention window out of range: {0:?}")]
    InvalidWindow(Duration),
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Config for the retention sweeper.
///
/// Eviction is purely by age: a job still `Processing` after `retention` is
/// removed like any other. A late result for it is then dropped by the store.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    pub interval: Duration,
    pub retention: Duration,
}

impl Default for RetentionSweeper {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
            retention: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Handle for the running sweeper (shutdown + trigger hook).
#[derive(Debug)]
pub struct RetentionSweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    trigger: mpsc::Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl RetentionSweeperHandle {
    /// Request an immediate sweep.
    ///
    /// Triggers are coalesced: if one is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the sweeper and wait for its task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl RetentionSweeper {
    pub fn new(interval: Duration, retention: Duration) -> Self {
        Self {
            interval,
            retention,
        }
    }

    /// Oldest `created_at` that survives a sweep run at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SweepError> {
        let window = chrono::Duration::from_std(self.retention)
            .map_err(|_| SweepError::InvalidWindow(self.retention))?;
        now.checked_sub_signed(window)
            .ok_or(SweepError::InvalidWindow(self.retention))
    }

    /// Run one sweep as if the clock read `now`. Returns the number of evicted jobs.
    pub fn sweep_at<S: JobStore>(
        &self,
        store: &S,
        now: DateTime<Utc>,
    ) -> Result<usize, SweepError> {
        let cutoff = self.cutoff(now)?;
        Ok(store.remove_older_than(cutoff)?)
    }

    /// Spawn the sweeper on the current Tokio runtime.
    ///
    /// - Schedule: first sweep one `interval` after start, then every `interval`
    /// - Trigger: `handle.trigger()` forces a sweep now
    /// - Failures: logged and skipped; the schedule keeps running
    pub fn spawn<S>(&self, name: &'static str, store: S) -> RetentionSweeperHandle
    where
        S: JobStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::channel::<()>(1);

        let join = tokio::spawn(sweeper_loop(
            name,
            self.clone(),
            store,
            shutdown_rx,
            trigger_rx,
        ));

        RetentionSweeperHandle {
            shutdown: Some(shutdown_tx),
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

async fn sweeper_loop<S: JobStore>(
    name: &'static str,
    cfg: RetentionSweeper,
    store: S,
    mut shutdown_rx: oneshot::Receiver<()>,
    mut trigger_rx: mpsc::Receiver<()>,
) {
    info!(
        sweeper = name,
        interval_secs = cfg.interval.as_secs(),
        retention_secs = cfg.retention.as_secs(),
        "retention sweeper started"
    );

    let mut ticker = tokio::time::interval_at(Instant::now() + cfg.interval, cfg.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            // Shutdown has priority.
            biased;
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {}
            Some(()) = trigger_rx.recv() => {
                debug!(sweeper = name, "sweep triggered");
            }
        }

        match cfg.sweep_at(&store, Utc::now()) {
            Ok(0) => debug!(sweeper = name, "sweep found nothing to evict"),
            Ok(evicted) => info!(sweeper = name, evicted, "evicted expired jobs"),
            Err(e) => warn!(sweeper = name, error = %e, "sweep failed; retrying next cycle"),
        }
    }

    info!(sweeper = name, "retention sweeper stopped");
}
