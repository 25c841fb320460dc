//! Debounced auto-push scheduler
//!
//! Sits between the CRUD layer and the [`SyncEngine`]. Every local store
//! mutation sends a notification through an mpsc channel; the scheduler
//! restarts a fixed quiet-period timer on each one, and only the trailing
//! expiry after a quiet burst actually pushes. This coalesces a burst of
//! edits into one save and prevents a push-per-keystroke storm.
//!
//! ## Flow
//!
//! ```text
//! CRUD layer ──notify()──→ mpsc ──→ AutoSyncScheduler ──→ SyncEngine::push_snapshot
//!                                        │
//!                                 quiet-period timer
//! ```
//!
//! Failures of these background pushes are never surfaced: they land in
//! the engine's status as `Error` and the next burst retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::{PushOutcome, SyncEngine};

/// Channel capacity for mutation notifications
///
/// Notifications are unit values and coalesce anyway; a full buffer just
/// means a push is already due.
const NOTIFY_BUFFER: usize = 64;

/// Handle the CRUD layer uses to report "something changed"
///
/// Cheap to clone; sending never blocks.
#[derive(Debug, Clone)]
pub struct MutationNotifier {
    tx: mpsc::Sender<()>,
}

impl MutationNotifier {
    /// Reports a local mutation, restarting the scheduler's quiet period
    pub fn notify(&self) {
        // A full buffer means the scheduler already has work queued;
        // dropping the extra notification loses nothing.
        let _ = self.tx.try_send(());
    }
}

/// Drives the debounced auto-push loop
pub struct AutoSyncScheduler {
    engine: Arc<SyncEngine>,
    change_rx: mpsc::Receiver<()>,
    quiet_period: Duration,
}

impl AutoSyncScheduler {
    /// Creates a scheduler and the notifier handle feeding it
    ///
    /// # Arguments
    /// * `engine` - The engine whose `push_snapshot` runs after each quiet period
    /// * `quiet_period` - How long mutations must stay quiet before the push fires
    pub fn new(engine: Arc<SyncEngine>, quiet_period: Duration) -> (Self, MutationNotifier) {
        let (tx, change_rx) = mpsc::channel(NOTIFY_BUFFER);
        let scheduler = Self {
            engine,
            change_rx,
            quiet_period,
        };
        (scheduler, MutationNotifier { tx })
    }

    /// Main loop; terminates when every notifier handle has been dropped
    pub async fn run(mut self) {
        info!(
            quiet_ms = self.quiet_period.as_millis() as u64,
            "auto-sync scheduler starting"
        );

        'outer: loop {
            // Wait for the first mutation of a burst.
            if self.change_rx.recv().await.is_none() {
                break;
            }

            // Trailing-edge debounce: each further mutation restarts the timer.
            loop {
                let timer = tokio::time::sleep(self.quiet_period);
                tokio::pin!(timer);
                tokio::select! {
                    event = self.change_rx.recv() => {
                        match event {
                            Some(()) => continue,
                            None => {
                                // Notifiers dropped mid-burst: flush once, then exit.
                                self.flush().await;
                                break 'outer;
                            }
                        }
                    }
                    _ = &mut timer => break,
                }
            }

            self.flush().await;
        }

        info!("auto-sync scheduler stopped");
    }

    /// Pushes the current snapshot; background failures only reach the status
    async fn flush(&self) {
        match self.engine.push_snapshot().await {
            Ok(PushOutcome::Completed) => {}
            Ok(PushOutcome::Skipped(reason)) => {
                debug!(?reason, "debounced push skipped");
            }
            Err(err) => {
                debug!(error = %err, "debounced push failed");
            }
        }
    }
}
