//! Session lifecycle management
//!
//! The [`SessionManager`] owns the authenticated identity: it validates
//! credentials client-side, authenticates against the backend, persists
//! the session through the credential store, and installs/clears it on the
//! sync engine. Startup session restore defers validity checking to the
//! first pull.

use std::sync::Arc;

use tracing::{info, warn};

use carelog_core::domain::errors::DomainError;
use carelog_core::domain::session::Session;
use carelog_core::ports::credential_store::ICredentialStore;
use carelog_core::ports::remote_store::IRemoteStore;

use crate::engine::SyncEngine;
use crate::SyncError;

/// Minimum accepted password length, checked before any network call
const MIN_PASSWORD_LEN: usize = 6;

/// Owns signup, login, logout, and session restore
pub struct SessionManager {
    remote: Arc<dyn IRemoteStore>,
    credentials: Arc<dyn ICredentialStore>,
    engine: Arc<SyncEngine>,
}

impl SessionManager {
    /// Creates a manager over the given dependencies
    pub fn new(
        remote: Arc<dyn IRemoteStore>,
        credentials: Arc<dyn ICredentialStore>,
        engine: Arc<SyncEngine>,
    ) -> Self {
        Self {
            remote,
            credentials,
            engine,
        }
    }

    /// Client-side signup validation; never touches the network
    ///
    /// # Errors
    /// Returns `InvalidCredentials` for an empty username/password, a
    /// password shorter than six characters, or a confirmation mismatch
    pub fn validate_signup(
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<(), DomainError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(DomainError::InvalidCredentials(
                "username and password are required".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::InvalidCredentials(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if password != confirm {
            return Err(DomainError::InvalidCredentials(
                "password confirmation does not match".to_string(),
            ));
        }
        Ok(())
    }

    /// Creates an account and establishes its session
    ///
    /// On success the new account's first remote record is materialized by
    /// the initial pull (an empty account seeds defaults and pushes them,
    /// stamped with this device).
    pub async fn sign_up(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Session, SyncError> {
        Self::validate_signup(username, password, confirm)?;

        let session = self.remote.sign_up(username.trim(), password).await?;
        self.credentials.save(&session)?;
        self.engine.set_session(session.clone());
        info!(account_id = %session.account_id(), "account created");

        if let Err(err) = self.engine.pull().await {
            warn!(error = %err, "initial load after signup failed");
            self.discard_session();
            return Err(err.into());
        }
        Ok(session)
    }

    /// Authenticates an existing account and loads its data
    ///
    /// On success the session is persisted, the remote state is pulled,
    /// and a device-presence ping records this device as active. Any
    /// failure after authentication tears the half-established session
    /// back down.
    pub async fn log_in(&self, username: &str, password: &str) -> Result<Session, SyncError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(DomainError::InvalidCredentials(
                "username and password are required".to_string(),
            )
            .into());
        }

        let session = self.remote.log_in(username.trim(), password).await?;
        self.credentials.save(&session)?;
        self.engine.set_session(session.clone());
        info!(account_id = %session.account_id(), "logged in");

        if let Err(err) = self.engine.pull().await {
            warn!(error = %err, "initial load after login failed");
            self.discard_session();
            return Err(err.into());
        }
        if let Err(err) = self.engine.push_device_presence().await {
            // Non-fatal: the marker is diagnostic only.
            warn!(error = %err, "device presence ping failed");
        }
        Ok(session)
    }

    /// Clears the session, the persisted credentials, and the local store
    ///
    /// Deliberately does **not** push first: any unsynced local edit at
    /// logout time is lost. This preserves the long-standing behavior the
    /// rest of the system expects; callers wanting a final flush can run
    /// `push_snapshot` before calling this.
    pub fn log_out(&self) -> Result<(), SyncError> {
        self.credentials.clear()?;
        self.discard_session();
        info!("signed out");
        Ok(())
    }

    /// Re-enters the authenticated state from persisted credentials
    ///
    /// Does not verify the session against the backend — validity checking
    /// is deferred to the first pull, which clears the session on an auth
    /// rejection.
    pub fn restore_session(&self) -> Result<Option<Session>, SyncError> {
        let Some(session) = self.credentials.load()? else {
            return Ok(None);
        };
        info!(account_id = %session.account_id(), "restored persisted session");
        self.engine.set_session(session.clone());
        Ok(Some(session))
    }

    /// Tears down engine session state and the local store
    fn discard_session(&self) {
        if let Err(err) = self.credentials.clear() {
            warn!(error = %err, "failed to clear persisted credentials");
        }
        self.engine.clear_session();
        if let Ok(mut store) = self.engine.store().lock() {
            store.clear();
        }
        self.engine.reset();
    }
}
