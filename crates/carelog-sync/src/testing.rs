//! In-memory fakes for engine, scheduler, session, and gate tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use carelog_core::domain::newtypes::{AccountId, DeviceId, RecordId, SessionToken};
use carelog_core::domain::record::{RecordPatch, RemoteRecord};
use carelog_core::domain::session::Session;
use carelog_core::domain::store::LocalStore;
use carelog_core::ports::credential_store::ICredentialStore;
use carelog_core::ports::remote_store::{IRemoteStore, RemoteError};
use carelog_core::ports::state_store::ILocalStateStore;

use crate::engine::{Connectivity, SharedLocalStore, SyncEngine};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The account id every fake session belongs to
pub const FAKE_ACCOUNT: &str = "acc-fake";

/// A session for [`FAKE_ACCOUNT`]
pub fn fake_session() -> Session {
    Session::new(
        AccountId::new(FAKE_ACCOUNT).unwrap(),
        SessionToken::new("sess-fake").unwrap(),
    )
}

/// In-memory remote store holding at most one record
///
/// `save_record` applies patches the way the real dedup/merge does at the
/// field-group level: present groups overwrite, absent groups survive.
#[derive(Default)]
pub struct FakeRemoteStore {
    record: Mutex<Option<RemoteRecord>>,
    save_calls: AtomicUsize,
    load_calls: AtomicUsize,
    save_delay: Mutex<Option<Duration>>,
    failing_saves: AtomicBool,
    failing_loads: AtomicBool,
    rejecting_auth: AtomicBool,
    unreachable: AtomicBool,
}

impl FakeRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a stored record
    pub fn with_record(self, record: RemoteRecord) -> Self {
        *lock(&self.record) = Some(record);
        self
    }

    /// Holds every save for the given duration (guard tests)
    pub fn with_save_delay(self, delay: Duration) -> Self {
        *lock(&self.save_delay) = Some(delay);
        self
    }

    /// Fails every save with a server error
    pub fn with_failing_saves(self) -> Self {
        self.failing_saves.store(true, Ordering::Release);
        self
    }

    /// Fails every load with a server error
    pub fn with_failing_loads(self) -> Self {
        self.failing_loads.store(true, Ordering::Release);
        self
    }

    /// Rejects every session-carrying call with an auth failure
    pub fn with_rejected_auth(self) -> Self {
        self.rejecting_auth.store(true, Ordering::Release);
        self
    }

    /// Reports the backend as unreachable
    pub fn with_unreachable(self) -> Self {
        self.unreachable.store(true, Ordering::Release);
        self
    }

    pub fn set_failing_saves(&self, failing: bool) {
        self.failing_saves.store(failing, Ordering::Release);
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::Acquire)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::Acquire)
    }

    /// The currently stored record
    pub fn record(&self) -> Option<RemoteRecord> {
        lock(&self.record).clone()
    }

    fn server_error() -> RemoteError {
        RemoteError::Server {
            status: 500,
            message: "injected failure".to_string(),
        }
    }

    fn apply_patch(record: &mut RemoteRecord, patch: &RecordPatch) {
        if let Some(members) = &patch.members {
            record.members = members.clone();
        }
        if let Some(active) = &patch.active_member_id {
            record.active_member_id = Some(active.clone());
        }
        if let Some(datasets) = &patch.member_datasets {
            record.member_datasets = datasets.clone();
        }
        if let Some(dictionaries) = &patch.shared_dictionaries {
            record.shared_dictionaries = Some(dictionaries.clone());
        }
        if let Some(settings) = &patch.api_settings {
            record.api_settings = Some(settings.clone());
        }
        if let Some(device) = &patch.device_id {
            record.device_id = Some(device.clone());
        }
        if let Some(at) = patch.last_updated_at {
            record.last_updated_at = Some(at);
        }
        if let Some(at) = patch.last_active_at {
            record.last_active_at = Some(at);
        }
        record.updated_at = Some(chrono::Utc::now());
    }
}

#[async_trait]
impl IRemoteStore for FakeRemoteStore {
    async fn sign_up(&self, _username: &str, _password: &str) -> Result<Session, RemoteError> {
        if self.rejecting_auth.load(Ordering::Acquire) {
            return Err(RemoteError::AuthFailed("rejected".to_string()));
        }
        Ok(fake_session())
    }

    async fn log_in(&self, _username: &str, _password: &str) -> Result<Session, RemoteError> {
        if self.rejecting_auth.load(Ordering::Acquire) {
            return Err(RemoteError::AuthFailed("rejected".to_string()));
        }
        Ok(fake_session())
    }

    async fn current_account(&self, session: &Session) -> Result<AccountId, RemoteError> {
        if self.rejecting_auth.load(Ordering::Acquire) {
            return Err(RemoteError::AuthFailed("rejected".to_string()));
        }
        Ok(session.account_id().clone())
    }

    async fn load_record(&self, _session: &Session) -> Result<Option<RemoteRecord>, RemoteError> {
        self.load_calls.fetch_add(1, Ordering::AcqRel);
        if self.rejecting_auth.load(Ordering::Acquire) {
            return Err(RemoteError::AuthFailed("rejected".to_string()));
        }
        if self.failing_loads.load(Ordering::Acquire) {
            return Err(Self::server_error());
        }
        Ok(lock(&self.record).clone())
    }

    async fn save_record(
        &self,
        session: &Session,
        patch: &RecordPatch,
    ) -> Result<RemoteRecord, RemoteError> {
        let delay = *lock(&self.save_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.save_calls.fetch_add(1, Ordering::AcqRel);
        if self.failing_saves.load(Ordering::Acquire) {
            return Err(Self::server_error());
        }

        let mut stored = lock(&self.record);
        let record = match stored.as_mut() {
            Some(record) => {
                Self::apply_patch(record, patch);
                record.clone()
            }
            None => {
                let record = RemoteRecord::from_patch(
                    RecordId::new("rec-fake").unwrap(),
                    session.account_id().clone(),
                    patch,
                    chrono::Utc::now(),
                );
                *stored = Some(record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn check_reachability(&self) -> bool {
        !self.unreachable.load(Ordering::Acquire)
    }
}

/// In-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    session: Mutex<Option<Session>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, session: Session) -> Self {
        *lock(&self.session) = Some(session);
        self
    }
}

impl ICredentialStore for MemoryCredentialStore {
    fn save(&self, session: &Session) -> anyhow::Result<()> {
        *lock(&self.session) = Some(session.clone());
        Ok(())
    }

    fn load(&self) -> anyhow::Result<Option<Session>> {
        Ok(lock(&self.session).clone())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *lock(&self.session) = None;
        Ok(())
    }
}

/// In-memory installation-state store
#[derive(Default)]
pub struct MemoryStateStore {
    map: Mutex<std::collections::BTreeMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, value: &str) -> Self {
        lock(&self.map).insert(key.to_string(), value.to_string());
        self
    }
}

impl ILocalStateStore for MemoryStateStore {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.map).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        lock(&self.map).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        lock(&self.map).remove(key);
        Ok(())
    }
}

/// Builds an online, authenticated engine over the given fake
///
/// Returns the engine, the fake (for call assertions), and the shared
/// store handle. The store starts empty and unloaded.
pub fn engine_with(fake: FakeRemoteStore) -> (Arc<SyncEngine>, Arc<FakeRemoteStore>, SharedLocalStore) {
    let fake = Arc::new(fake);
    let store: SharedLocalStore = Arc::new(Mutex::new(LocalStore::new()));
    let engine = Arc::new(SyncEngine::new(
        fake.clone(),
        store.clone(),
        DeviceId::generate(),
        Connectivity::new(true),
    ));
    engine.set_session(fake_session());
    (engine, fake, store)
}
