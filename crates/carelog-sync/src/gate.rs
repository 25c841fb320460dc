//! Startup sequencing: version gate, device identity, bootstrap
//!
//! The version gate guards against a freshly upgraded client silently
//! running a stale cached session against data shapes the new client no
//! longer understands: when the running version is newer than the stored
//! last-seen version, the persisted credentials are cleared and the user
//! must log in again.
//!
//! [`Bootstrap::run`] sequences the whole startup: connectivity probe →
//! version gate → session restore → initial pull + device-presence push.

use std::sync::Arc;

use tracing::{info, warn};

use carelog_core::domain::newtypes::{AccountId, DeviceId};
use carelog_core::domain::version::AppVersion;
use carelog_core::ports::credential_store::ICredentialStore;
use carelog_core::ports::remote_store::IRemoteStore;
use carelog_core::ports::state_store::{keys, ILocalStateStore};

use crate::engine::SyncEngine;
use crate::session::SessionManager;
use crate::SyncError;

// ============================================================================
// Device identity
// ============================================================================

/// Loads the installation's device id, minting and persisting it on first run
///
/// The id is never rotated afterwards.
pub fn ensure_device_id(state_store: &dyn ILocalStateStore) -> anyhow::Result<DeviceId> {
    if let Some(stored) = state_store.get(keys::DEVICE_ID)? {
        if let Ok(id) = DeviceId::new(stored) {
            return Ok(id);
        }
        warn!("stored device id is empty, minting a new one");
    }
    let id = DeviceId::generate();
    state_store.set(keys::DEVICE_ID, id.as_str())?;
    info!(device_id = %id, "generated installation device id");
    Ok(id)
}

// ============================================================================
// Version gate
// ============================================================================

/// State of the version gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// `check` has not run yet
    Uninitialized,
    /// The stored session (if any) may be used
    Ready,
    /// The client was upgraded; the stored session was cleared and the
    /// user must go through login/signup again
    MustRelogin,
}

/// Compares the persisted last-seen version against the running client
pub struct VersionGate {
    state_store: Arc<dyn ILocalStateStore>,
    credentials: Arc<dyn ICredentialStore>,
    running: AppVersion,
    state: GateState,
}

impl VersionGate {
    /// Creates a gate for the running client version
    pub fn new(
        state_store: Arc<dyn ILocalStateStore>,
        credentials: Arc<dyn ICredentialStore>,
    ) -> Self {
        Self::with_running_version(state_store, credentials, AppVersion::running())
    }

    /// Creates a gate with an explicit running version (useful for testing)
    pub fn with_running_version(
        state_store: Arc<dyn ILocalStateStore>,
        credentials: Arc<dyn ICredentialStore>,
        running: AppVersion,
    ) -> Self {
        Self {
            state_store,
            credentials,
            running,
            state: GateState::Uninitialized,
        }
    }

    /// The gate's current state
    pub fn state(&self) -> GateState {
        self.state
    }

    /// Runs the version check and persists the running version
    ///
    /// Running newer than stored → clear credentials, `MustRelogin`.
    /// Equal, stored-newer (downgrade), or no stored version → `Ready`.
    /// An unparseable stored marker is treated as absent.
    pub fn check(&mut self) -> anyhow::Result<GateState> {
        let stored = self
            .state_store
            .get(keys::LAST_SEEN_VERSION)?
            .and_then(|v| v.parse::<AppVersion>().ok());

        let next = match stored {
            Some(stored) if self.running > stored => {
                info!(
                    stored = %stored,
                    running = %self.running,
                    "client upgraded, clearing stored session"
                );
                self.credentials.clear()?;
                GateState::MustRelogin
            }
            _ => GateState::Ready,
        };

        self.state_store
            .set(keys::LAST_SEEN_VERSION, &self.running.to_string())?;
        self.state = next;
        Ok(next)
    }
}

// ============================================================================
// Bootstrap
// ============================================================================

/// What the application should do after startup sequencing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupOutcome {
    /// The backend is unreachable; the app runs nothing network-facing
    Offline,
    /// The version gate cleared the session; show the login flow
    MustRelogin,
    /// No persisted session exists; show the login flow
    SignedOut,
    /// A session was restored and remote state is loaded
    Ready {
        /// The restored account
        account_id: AccountId,
    },
}

/// Sequences startup: connectivity → version gate → restore → initial pull
pub struct Bootstrap {
    remote: Arc<dyn IRemoteStore>,
    state_store: Arc<dyn ILocalStateStore>,
    credentials: Arc<dyn ICredentialStore>,
    engine: Arc<SyncEngine>,
    sessions: Arc<SessionManager>,
}

impl Bootstrap {
    /// Creates the bootstrap over the given dependencies
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        state_store: Arc<dyn ILocalStateStore>,
        credentials: Arc<dyn ICredentialStore>,
        engine: Arc<SyncEngine>,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            remote,
            state_store,
            credentials,
            engine,
            sessions,
        }
    }

    /// Runs the startup sequence
    pub async fn run(&self) -> Result<StartupOutcome, SyncError> {
        self.run_with_version(AppVersion::running()).await
    }

    /// Runs the startup sequence with an explicit running version
    /// (useful for testing the gate path)
    pub async fn run_with_version(
        &self,
        running: AppVersion,
    ) -> Result<StartupOutcome, SyncError> {
        // Step 1: connectivity probe
        let online = self.remote.check_reachability().await;
        self.engine.connectivity().set_online(online);
        if !online {
            info!("backend unreachable at startup");
            return Ok(StartupOutcome::Offline);
        }

        // Step 2: version gate
        let mut gate = VersionGate::with_running_version(
            self.state_store.clone(),
            self.credentials.clone(),
            running,
        );
        if gate.check()? == GateState::MustRelogin {
            return Ok(StartupOutcome::MustRelogin);
        }

        // Step 3: session restore
        let Some(session) = self.sessions.restore_session()? else {
            return Ok(StartupOutcome::SignedOut);
        };

        // Step 4: initial pull, deferring validity checking to it
        if let Err(err) = self.engine.pull().await {
            warn!(error = %err, "initial pull failed, signing out");
            self.sessions.log_out()?;
            return Ok(StartupOutcome::SignedOut);
        }
        if let Err(err) = self.engine.push_device_presence().await {
            warn!(error = %err, "device presence ping failed");
        }

        Ok(StartupOutcome::Ready {
            account_id: session.account_id().clone(),
        })
    }
}
