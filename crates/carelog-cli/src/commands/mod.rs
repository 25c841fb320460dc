//! CLI commands and shared wiring

pub mod login;
pub mod logout;
pub mod member;
pub mod signup;
pub mod status;
pub mod sync;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::info;

use carelog_core::config::Config;
use carelog_core::domain::store::LocalStore;
use carelog_core::ports::IRemoteStore;
use carelog_remote::{FileStateStore, KeyringCredentialStore, RestClient, RestRemoteStore};
use carelog_sync::engine::{Connectivity, SharedLocalStore, SyncEngine};
use carelog_sync::gate::{ensure_device_id, Bootstrap};
use carelog_sync::session::SessionManager;

/// Everything a command needs, wired once
///
/// Cross-cutting inputs (device id, connectivity, configuration) are built
/// here and passed into the engine explicitly.
pub struct AppStack {
    pub config: Config,
    pub remote: Arc<RestRemoteStore>,
    pub credentials: Arc<KeyringCredentialStore>,
    pub state_store: Arc<FileStateStore>,
    pub store: SharedLocalStore,
    pub engine: Arc<SyncEngine>,
    pub sessions: Arc<SessionManager>,
}

/// Loads configuration and wires the adapter stack
pub fn build_stack() -> Result<AppStack> {
    let config_path = Config::default_path();
    let config = Config::load_or_default(&config_path);
    info!(config_path = %config_path.display(), "loaded configuration");

    let remote = Arc::new(RestRemoteStore::new(RestClient::new(&config.remote)));
    let credentials = Arc::new(KeyringCredentialStore::new());
    let state_store = Arc::new(FileStateStore::new(FileStateStore::default_path()));

    let device_id =
        ensure_device_id(state_store.as_ref()).context("Failed to load device identity")?;

    let store: SharedLocalStore = Arc::new(Mutex::new(LocalStore::new()));
    let engine = Arc::new(SyncEngine::new(
        remote.clone(),
        store.clone(),
        device_id,
        Connectivity::new(true),
    ));
    let sessions = Arc::new(SessionManager::new(
        remote.clone(),
        credentials.clone(),
        engine.clone(),
    ));

    Ok(AppStack {
        config,
        remote,
        credentials,
        state_store,
        store,
        engine,
        sessions,
    })
}

impl AppStack {
    /// Builds the startup sequencer over this stack
    pub fn bootstrap(&self) -> Bootstrap {
        Bootstrap::new(
            self.remote.clone(),
            self.state_store.clone(),
            self.credentials.clone(),
            self.engine.clone(),
            self.sessions.clone(),
        )
    }

    /// Probes the backend and records the result on the engine
    pub async fn probe_connectivity(&self) -> bool {
        let online = self.remote.check_reachability().await;
        self.engine.connectivity().set_online(online);
        online
    }
}
