//! Authentication error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Login failed: unknown rep or wrong password. The two are never told apart.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password confirmation for a destructive action failed.
    #[error("incorrect password")]
    IncorrectPassword,

    /// The account was already locked when the attempt arrived.
    #[error("account locked until {until}")]
    Locked { until: DateTime<Utc> },

    /// This attempt was the one that locked the account.
    #[error("account locked until {until} after too many failed attempts")]
    LockedNow { until: DateTime<Utc> },

    /// No active rep has the given id.
    #[error("sales rep not found")]
    RepNotFound,

    /// An active rep already uses the email.
    #[error("email already registered")]
    EmailTaken,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
