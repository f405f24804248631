//! Boundary validation: raw request fields into typed inputs.
//!
//! Each operation that accepts caller data has one constructor here. The
//! engine only ever sees the validated types, so trimming and presence rules
//! are applied exactly once.

use crate::error::ValidationError;
use crate::fund::{FundKind, NewFundEntry};
use crate::token::Holder;
use crate::types::Amount;

/// Largest batch a single generate call may create.
pub const MAX_BATCH_SIZE: u32 = 10_000;

/// Longest accepted holder name or roll, in characters.
pub const MAX_FIELD_LEN: usize = 128;

/// Longest accepted ledger note, in characters.
pub const MAX_NOTE_LEN: usize = 512;

/// Check a requested batch size against `1..=max`.
pub fn validate_batch_size(count: u64, max: u32) -> Result<u32, ValidationError> {
    let max = max.min(MAX_BATCH_SIZE);
    if count == 0 || count > u64::from(max) {
        return Err(ValidationError::BatchSizeOutOfRange { got: count, max });
    }
    Ok(count as u32)
}

/// Check a price or ledger amount against [`Amount::MAX`].
pub fn validate_amount(units: u64) -> Result<Amount, ValidationError> {
    if units > Amount::MAX.units() {
        return Err(ValidationError::AmountTooLarge {
            got: units,
            max: Amount::MAX.units(),
        });
    }
    Ok(Amount(units))
}

fn required(field: &'static str, raw: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::FieldTooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Validated input for binding a token to a holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRequest {
    pub holder: Holder,
    /// `None` (or zero) means "use the configured default price".
    pub price: Option<Amount>,
}

impl AssignRequest {
    /// Build from raw fields. Name and roll are trimmed and must be non-empty.
    pub fn new(name: &str, roll: &str, price: Option<u64>) -> Result<Self, ValidationError> {
        let name = required("name", name, MAX_FIELD_LEN)?;
        let roll = required("roll", roll, MAX_FIELD_LEN)?;
        let price = price.map(validate_amount).transpose()?;
        Ok(Self {
            holder: Holder { name, roll },
            price,
        })
    }

    /// The price to write, falling back to `default` when omitted or zero.
    pub fn effective_price(&self, default: Amount) -> Amount {
        self.price.unwrap_or(Amount::ZERO).or_default_to(default)
    }
}

/// Validated input for a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundRequest {
    entry: NewFundEntry,
}

impl FundRequest {
    /// Build from raw fields. `amount` must be positive and storable, and
    /// `note` non-empty.
    /// A blank `origin` falls back to the kind's default tag.
    pub fn new(
        kind: FundKind,
        amount: u64,
        note: &str,
        origin: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if amount == 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        let amount = validate_amount(amount)?;
        let note = required("note", note, MAX_NOTE_LEN)?;
        let origin = origin
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or_else(|| kind.default_origin())
            .to_string();

        Ok(Self {
            entry: NewFundEntry {
                kind,
                amount,
                note,
                origin,
            },
        })
    }

    pub fn credit(amount: u64, note: &str) -> Result<Self, ValidationError> {
        Self::new(FundKind::Credit, amount, note, None)
    }

    pub fn debit(amount: u64, note: &str) -> Result<Self, ValidationError> {
        Self::new(FundKind::Debit, amount, note, None)
    }

    pub fn entry(&self) -> &NewFundEntry {
        &self.entry
    }
}
