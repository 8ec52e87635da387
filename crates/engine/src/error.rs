//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] thrown when a group, expense or member does not exist.
//! - [`InvalidShares`] thrown when payer/split shares do not add up to the
//!   expense amount.
//! - [`Unauthorized`] thrown when a credential cannot be verified.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidShares`]: EngineError::InvalidShares
//!  [`Unauthorized`]: EngineError::Unauthorized
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid shares: {0}")]
    InvalidShares(String),
    #[error("Invalid group: {0}")]
    InvalidGroup(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Returns `true` for errors caused by caller input (as opposed to
    /// storage failures).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::InvalidAmount(_) | Self::InvalidShares(_) | Self::InvalidGroup(_)
        )
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidShares(a), Self::InvalidShares(b)) => a == b,
            (Self::InvalidGroup(a), Self::InvalidGroup(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Snapshot(a), Self::Snapshot(b)) => a.to_string() == b.to_string(),
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
