//! # Gatepass Core
//!
//! Pure records for the Gatepass check-in system: tokens, holders, fund
//! entries, redemption codes and validated request inputs.
//!
//! This crate contains no I/O, no storage, no networking. Everything that
//! touches persistence lives in `gatepass-store`, and the state machine that
//! drives tokens through their lifecycle lives in `gatepass`.
//!
//! ## Key Types
//!
//! - [`Token`] - One issued entry pass and its lifecycle fields
//! - [`TokenCode`] - The secret redemption string printed into the QR code
//! - [`TokenState`] - `Created` → `Assigned` → `Entered`
//! - [`FundEntry`] - One append-only ledger record
//! - [`Amount`] - Non-negative money in whole currency units
//!
//! ## Validation
//!
//! Request bodies are turned into typed inputs exactly once, at the
//! boundary. See [`validation`].

pub mod clock;
pub mod code;
pub mod error;
pub mod fund;
pub mod token;
pub mod types;
pub mod validation;

pub use clock::now_millis;
pub use code::{CodeSource, OsCodeSource, CODE_BYTES, CODE_HEX_LEN};
pub use error::{CoreError, ValidationError};
pub use fund::{FundEntry, FundKind, NewFundEntry, DEFAULT_CREDIT_ORIGIN, DEFAULT_DEBIT_ORIGIN};
pub use token::{Assignment, Holder, Token, TokenState};
pub use types::{Amount, EntryId, TokenCode, TokenId};
pub use validation::{
    validate_amount, validate_batch_size, AssignRequest, FundRequest, MAX_BATCH_SIZE,
    MAX_FIELD_LEN, MAX_NOTE_LEN,
};
