//! Error types shared across the crate.

use thiserror::Error;

use crate::store::StoreError;

/// Main error type for account, setup, subscription and supervisor operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("account {0} not found, login first")]
    AccountNotFound(String),

    #[error("account {0} has no token set")]
    MissingToken(String),

    #[error("token rejected by the platform")]
    InvalidToken,

    #[error("setup '{0}' not found")]
    SetupNotFound(String),

    #[error("setup '{0}' already exists")]
    SetupExists(String),

    #[error("interval must be positive, got {0}")]
    InvalidInterval(f64),

    #[error("random interval must not be negative, got {0}")]
    InvalidRandomInterval(f64),

    #[error("unknown package '{0}'")]
    UnknownPackage(String),

    #[error("subscription {0} not found")]
    SubscriptionNotFound(String),

    #[error("subscription {0} is expired or inactive")]
    SubscriptionInactive(String),

    #[error("subscription {0} is already bound to another user")]
    SubscriptionBound(String),

    #[error("admin {0} already exists")]
    AdminExists(String),
}

pub type Result<T> = std::result::Result<T, Error>;
