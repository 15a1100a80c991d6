//! Typed error hierarchy for the ledger.
//!
//! Two top-level enums cover the two subsystems:
//! - `StoreError` — SQLite store and repository failures
//! - `AuthError` — identity provider failures (credentials, sessions)

use thiserror::Error;

/// Errors from the SQLite store and the repository layer on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Database lock poisoned")]
    LockPoisoned,

    #[error("Database task panicked")]
    TaskPanicked,
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Errors from the in-process identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    Validation(String),

    #[error("Session is missing or expired")]
    SessionInvalid,

    #[error("Magic link is invalid or expired")]
    MagicLinkInvalid,

    #[error(transparent)]
    Store(#[from] StoreError),
}
