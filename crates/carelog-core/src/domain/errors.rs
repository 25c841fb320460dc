//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including client-side credential validation, identifier parsing,
//! and local store state errors. None of these ever reach the network.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Client-side credential validation failure (checked before any network call)
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Invalid application version string
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Referenced member does not exist in the local store
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// The last remaining member cannot be removed
    #[error("At least one member must remain")]
    LastMember,
}
