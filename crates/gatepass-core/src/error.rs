//! Error types for Gatepass Core.

use thiserror::Error;

/// Errors raised while parsing or decoding core records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid token code: {0}")]
    InvalidCode(String),

    #[error("invalid fund kind: {0}")]
    InvalidFundKind(String),

    #[error("invalid token state: {0}")]
    InvalidTokenState(String),
}

/// Malformed or missing request input.
///
/// Raised before any persistence access; the operation is never attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field {field} exceeds {max} characters")]
    FieldTooLong { field: &'static str, max: usize },

    #[error("batch size must be between 1 and {max}, got {got}")]
    BatchSizeOutOfRange { got: u64, max: u32 },

    #[error("amount must be positive")]
    NonPositiveAmount,

    #[error("amount {got} exceeds the maximum of {max}")]
    AmountTooLarge { got: u64, max: u64 },
}
