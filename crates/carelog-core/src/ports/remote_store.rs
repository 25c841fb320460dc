//! Remote record store port (driven/secondary port)
//!
//! This module defines the interface for the backend the sync engine talks
//! to. The primary implementation is the REST adapter in carelog-remote.
//!
//! ## Design Notes
//!
//! - Unlike the storage ports, methods here return a classified
//!   [`RemoteError`] rather than `anyhow::Error`: the engine and session
//!   manager must match on the failure family (network vs auth vs server)
//!   to pick the recovery path.
//! - `save_record` is the dedup/merge save path: implementations guarantee
//!   that after a successful save exactly one record exists for the account
//!   and that field groups absent from the patch are preserved.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::newtypes::AccountId;
use crate::domain::record::{RecordPatch, RemoteRecord};
use crate::domain::session::Session;

/// Classified failure of a backend call
///
/// Transport failures (DNS, TLS, timeout, refused connection) normalize to
/// `Network`; non-2xx HTTP responses classify by status family.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Offline or unreachable backend; recoverable, the user gets a retry path
    #[error("network unavailable: {0}")]
    Network(String),

    /// Bad credentials or an expired session (HTTP 401)
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// A server-side failure (HTTP 5xx); surfaced as "try later"
    #[error("server error ({status}): {message}")]
    Server {
        /// The HTTP status code
        status: u16,
        /// Backend-provided error message, if any
        message: String,
    },

    /// Any other rejected request (remaining 4xx)
    #[error("request rejected ({status}): {message}")]
    Request {
        /// The HTTP status code
        status: u16,
        /// Backend-provided error message, if any
        message: String,
    },

    /// A 2xx response whose body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Returns true for offline/unreachable failures
    pub fn is_network(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }

    /// Returns true when the session credentials were rejected
    pub fn is_auth(&self) -> bool {
        matches!(self, RemoteError::AuthFailed(_))
    }
}

/// Port trait for the backend record store
///
/// The adapter owns the wire format and the dedup/merge algorithm; the
/// engine only sees sessions, records and patches. The client does not
/// retry automatically — retry policy belongs to the engine.
#[async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Creates a new account and returns its session
    async fn sign_up(&self, username: &str, password: &str) -> Result<Session, RemoteError>;

    /// Authenticates an existing account and returns its session
    async fn log_in(&self, username: &str, password: &str) -> Result<Session, RemoteError>;

    /// Validates a session against the backend and returns its account id
    async fn current_account(&self, session: &Session) -> Result<AccountId, RemoteError>;

    /// Loads the account's record, or `None` when the account has none yet
    ///
    /// When stray duplicates exist, returns only the freshest one (cleanup
    /// happens on the next save).
    async fn load_record(&self, session: &Session) -> Result<Option<RemoteRecord>, RemoteError>;

    /// Saves a partial payload through the dedup/merge path
    ///
    /// Guarantees: after success exactly one record exists for the account,
    /// reflecting the union of previously-stored fields and the patch.
    async fn save_record(
        &self,
        session: &Session,
        patch: &RecordPatch,
    ) -> Result<RemoteRecord, RemoteError>;

    /// Probes backend reachability
    ///
    /// Any HTTP response — including an error status — counts as reachable;
    /// only a transport failure means offline.
    async fn check_reachability(&self) -> bool;
}
