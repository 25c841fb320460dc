//! The synchronization engine
//!
//! The [`SyncEngine`] orchestrates reconciliation between the in-memory
//! [`LocalStore`] and the account's single authoritative remote record.
//!
//! ## Sync flow
//!
//! 1. **Push**: snapshot the local store into a partial payload, save it
//!    through the remote port's dedup/merge path
//! 2. **Pull**: load the remote record and replace the local store
//!    wholesale (pull never merges — it is a full snapshot load)
//! 3. **Status**: publish `Idle | Syncing | Synced | Error` through a
//!    watch channel the UI observes
//!
//! ## Single-flight guard
//!
//! At most one guarded push runs at a time. A push attempted while another
//! is in flight is **dropped, not queued** — the debounce scheduler will
//! observe the guard as free on its next trailing push. The guard is an
//! explicit state value ([`PushGuard`]) released by an RAII permit, so a
//! failed save can never wedge it. The device-presence ping bypasses the
//! guard entirely: it must be neither starved by a full-data push nor
//! block one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use carelog_core::domain::newtypes::DeviceId;
use carelog_core::domain::record::RecordPatch;
use carelog_core::domain::session::Session;
use carelog_core::domain::status::SyncStatus;
use carelog_core::domain::store::LocalStore;
use carelog_core::ports::remote_store::{IRemoteStore, RemoteError};

/// The local store handle shared between the CRUD layer and the engine
pub type SharedLocalStore = Arc<Mutex<LocalStore>>;

/// Locks a mutex, recovering the inner value if a holder panicked
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Connectivity
// ============================================================================

/// Shared online/offline flag
///
/// Set by the bootstrap's reachability probe (and by anything else that
/// learns about connectivity changes); read by the engine before every
/// network-touching operation.
#[derive(Debug, Clone)]
pub struct Connectivity(Arc<AtomicBool>);

impl Connectivity {
    /// Creates the flag with an initial state
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    /// Returns the current flag value
    pub fn is_online(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Updates the flag
    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::Release);
    }
}

// ============================================================================
// Single-flight guard
// ============================================================================

/// Explicit state of the single-flight push guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushGuard {
    /// No guarded push is running
    Idle,
    /// A guarded push is running; further guarded pushes are dropped
    InFlight,
}

/// RAII permit holding the guard in `InFlight` until dropped
///
/// Dropping the permit is the "finally" path: it runs on success, on
/// error, and on panic alike, so the guard can never stay wedged.
struct PushPermit<'a> {
    slot: &'a Mutex<PushGuard>,
}

impl<'a> PushPermit<'a> {
    fn try_acquire(slot: &'a Mutex<PushGuard>) -> Option<Self> {
        let mut state = lock_unpoisoned(slot);
        match *state {
            PushGuard::InFlight => None,
            PushGuard::Idle => {
                *state = PushGuard::InFlight;
                Some(Self { slot })
            }
        }
    }
}

impl Drop for PushPermit<'_> {
    fn drop(&mut self) {
        *lock_unpoisoned(self.slot) = PushGuard::Idle;
    }
}

// ============================================================================
// Push options and outcomes
// ============================================================================

/// Options for a push
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    /// Proceed even while a guarded push is in flight, without taking the
    /// guard. Reserved for the device-presence ping and the initial seed.
    pub bypass_guard: bool,
}

/// Why a push did not reach the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The connectivity flag is off
    Offline,
    /// No session is installed on the engine
    NotAuthenticated,
    /// The local store has not been populated yet
    NotLoaded,
    /// A guarded push is already in flight; this one is dropped, not queued
    PushInFlight,
}

/// Result of a push attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// The payload was saved remotely
    Completed,
    /// The push was a silent no-op (no network call, no status change)
    Skipped(SkipReason),
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Orchestrates push/pull between the local store and the remote record
///
/// All cross-cutting inputs — the remote port, the shared store, the
/// device identity, the connectivity flag — are explicit constructor
/// arguments, so the engine is testable without environment stubbing.
pub struct SyncEngine {
    /// Backend record store (dedup/merge lives behind this port)
    remote: Arc<dyn IRemoteStore>,
    /// The local store this engine snapshots and replaces
    store: SharedLocalStore,
    /// This installation's device marker
    device_id: DeviceId,
    /// Shared online/offline flag
    connectivity: Connectivity,
    /// Currently installed session, if any
    session: Mutex<Option<Session>>,
    /// Single-flight push guard
    guard: Mutex<PushGuard>,
    /// Publishes status transitions to observers
    status_tx: watch::Sender<SyncStatus>,
    /// Time of the last successful sync operation
    last_synced_at: Mutex<Option<DateTime<Utc>>>,
}

impl SyncEngine {
    /// Creates an engine over the given dependencies
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        store: SharedLocalStore,
        device_id: DeviceId,
        connectivity: Connectivity,
    ) -> Self {
        let (status_tx, _status_rx) = watch::channel(SyncStatus::Idle);
        Self {
            remote,
            store,
            device_id,
            connectivity,
            session: Mutex::new(None),
            guard: Mutex::new(PushGuard::Idle),
            status_tx,
            last_synced_at: Mutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // State accessors
    // ------------------------------------------------------------------

    /// The shared local store handle
    pub fn store(&self) -> &SharedLocalStore {
        &self.store
    }

    /// The shared connectivity flag
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Installs the session pushes and pulls run as
    pub fn set_session(&self, session: Session) {
        *lock_unpoisoned(&self.session) = Some(session);
    }

    /// Removes the installed session
    pub fn clear_session(&self) {
        *lock_unpoisoned(&self.session) = None;
    }

    /// The currently installed session, if any
    pub fn session(&self) -> Option<Session> {
        lock_unpoisoned(&self.session).clone()
    }

    /// Current status snapshot
    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    /// Subscribes to status transitions
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Time of the last successful sync, if any
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *lock_unpoisoned(&self.last_synced_at)
    }

    /// Current guard state, directly observable for tests and diagnostics
    pub fn is_push_in_flight(&self) -> bool {
        *lock_unpoisoned(&self.guard) == PushGuard::InFlight
    }

    /// Resets status bookkeeping back to idle (logout)
    pub fn reset(&self) {
        *lock_unpoisoned(&self.last_synced_at) = None;
        self.status_tx.send_replace(SyncStatus::Idle);
    }

    fn set_status(&self, status: SyncStatus) {
        self.status_tx.send_replace(status);
    }

    // ------------------------------------------------------------------
    // Push
    // ------------------------------------------------------------------

    /// Saves a partial payload through the remote dedup/merge path
    ///
    /// No-ops silently — no network call, no status change — when offline,
    /// unauthenticated, or (unless `bypass_guard`) while another push is in
    /// flight. Otherwise transitions status `Syncing → Synced` on success
    /// or `Syncing → Error` on failure; the guard is released on every
    /// path.
    pub async fn push(
        &self,
        patch: RecordPatch,
        options: PushOptions,
    ) -> Result<PushOutcome, RemoteError> {
        if !self.connectivity.is_online() {
            debug!("push skipped: offline");
            return Ok(PushOutcome::Skipped(SkipReason::Offline));
        }
        let Some(session) = self.session() else {
            debug!("push skipped: not authenticated");
            return Ok(PushOutcome::Skipped(SkipReason::NotAuthenticated));
        };

        let _permit = if options.bypass_guard {
            None
        } else {
            match PushPermit::try_acquire(&self.guard) {
                Some(permit) => Some(permit),
                None => {
                    debug!("push dropped: another push is in flight");
                    return Ok(PushOutcome::Skipped(SkipReason::PushInFlight));
                }
            }
        };

        debug!(fields = ?patch.touched_fields(), "pushing");
        self.set_status(SyncStatus::Syncing);
        match self.remote.save_record(&session, &patch).await {
            Ok(record) => {
                *lock_unpoisoned(&self.last_synced_at) = Some(Utc::now());
                self.set_status(SyncStatus::Synced);
                debug!(record_id = %record.record_id, "push completed");
                Ok(PushOutcome::Completed)
            }
            Err(err) => {
                warn!(error = %err, "push failed");
                self.set_status(SyncStatus::Error);
                Err(err)
            }
        }
    }

    /// Pushes the full local-store snapshot (the debounced auto-push payload)
    ///
    /// Skips silently while the store has not been populated yet.
    pub async fn push_snapshot(&self) -> Result<PushOutcome, RemoteError> {
        let patch = {
            let store = lock_unpoisoned(&self.store);
            if !store.is_loaded() {
                debug!("push skipped: store not loaded");
                return Ok(PushOutcome::Skipped(SkipReason::NotLoaded));
            }
            store.snapshot_patch(Utc::now())
        };
        self.push(patch, PushOptions::default()).await
    }

    /// Pushes the lightweight "this device is active" ping
    ///
    /// Always bypasses the guard: the ping must not be starved by a
    /// concurrent full-data push, nor block one.
    pub async fn push_device_presence(&self) -> Result<PushOutcome, RemoteError> {
        let patch = RecordPatch::device_presence(&self.device_id, Utc::now());
        self.push(patch, PushOptions { bypass_guard: true }).await
    }

    // ------------------------------------------------------------------
    // Pull
    // ------------------------------------------------------------------

    /// Loads the account's record and replaces the local store wholesale
    ///
    /// When the account has no record yet, seeds the store with defaults
    /// and immediately pushes to materialize the first record.
    pub async fn pull(&self) -> Result<(), RemoteError> {
        if !self.connectivity.is_online() {
            return Err(RemoteError::Network("offline".to_string()));
        }
        let Some(session) = self.session() else {
            return Err(RemoteError::AuthFailed("no active session".to_string()));
        };

        self.set_status(SyncStatus::Syncing);
        match self.remote.load_record(&session).await {
            Ok(Some(record)) => {
                lock_unpoisoned(&self.store).replace_from_record(&record);
                *lock_unpoisoned(&self.last_synced_at) = Some(Utc::now());
                self.set_status(SyncStatus::Synced);
                info!(record_id = %record.record_id, "pulled remote record");
                Ok(())
            }
            Ok(None) => {
                info!("account has no remote record, seeding defaults");
                let patch = {
                    let mut store = lock_unpoisoned(&self.store);
                    *store = LocalStore::with_defaults();
                    store.initial_patch(&self.device_id, Utc::now())
                };
                // Bypass the guard: nothing can be in flight during the
                // initial load, and the seed must not be droppable.
                match self
                    .push(patch, PushOptions { bypass_guard: true })
                    .await?
                {
                    PushOutcome::Completed => Ok(()),
                    PushOutcome::Skipped(reason) => {
                        warn!(?reason, "seed push skipped");
                        self.set_status(SyncStatus::Error);
                        Ok(())
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "pull failed");
                self.set_status(SyncStatus::Error);
                Err(err)
            }
        }
    }
}
