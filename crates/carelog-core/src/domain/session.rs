//! Authenticated session credentials
//!
//! A [`Session`] pairs the backend-assigned account id with the opaque
//! session token returned by login/signup. It is persisted across restarts
//! through the credential store port and invalidated on explicit logout,
//! credential rejection, or a forced version-upgrade relogin.

use serde::{Deserialize, Serialize};

use super::newtypes::{AccountId, SessionToken};

/// The authenticated identity this installation acts as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    account_id: AccountId,
    token: SessionToken,
}

impl Session {
    /// Creates a session from login/signup results
    pub fn new(account_id: AccountId, token: SessionToken) -> Self {
        Self { account_id, token }
    }

    /// The account this session belongs to
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// The opaque session credential sent with authenticated requests
    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}
