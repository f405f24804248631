//! Error types for the engine.

use gatepass_core::{TokenId, ValidationError};
use gatepass_perms::PermsError;
use gatepass_store::StoreError;
use thiserror::Error;

/// Errors that can occur during engine operations.
///
/// Conflicts such as an already assigned or already entered token are not
/// errors; they come back as outcome variants.
#[derive(Debug, Error)]
pub enum GatepassError {
    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Permission error.
    #[error("permission error: {0}")]
    Permission(#[from] PermsError),

    /// No token has this id.
    #[error("token not found: {0}")]
    NotFound(TokenId),

    /// Single-batch policy is active and a batch already exists.
    #[error("tokens already exist ({existing}); generate is limited to one batch")]
    TokensAlreadyExist { existing: u64 },

    /// Fresh codes kept colliding with issued ones.
    #[error("could not draw unique codes after {attempts} attempts ({remaining} still colliding)")]
    CodeSpaceExhausted { attempts: u32, remaining: usize },

    /// The reconciled balance does not fit the reporting type.
    #[error("balance out of range: {0}")]
    BalanceOutOfRange(i128),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, GatepassError>;
