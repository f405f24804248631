//! Ledger records.
//!
//! Fund entries are manually reported cash movements. They are appended once
//! and never updated or deleted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{Amount, EntryId};

/// Origin tag used for credits when the caller gives none.
pub const DEFAULT_CREDIT_ORIGIN: &str = "manual-credit";

/// Origin tag used for debits when the caller gives none.
pub const DEFAULT_DEBIT_ORIGIN: &str = "expense";

/// Direction of a fund entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundKind {
    /// Money added to the pot.
    Credit,
    /// Money withdrawn from the pot.
    Debit,
}

impl FundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FundKind::Credit => "credit",
            FundKind::Debit => "debit",
        }
    }

    pub fn default_origin(&self) -> &'static str {
        match self {
            FundKind::Credit => DEFAULT_CREDIT_ORIGIN,
            FundKind::Debit => DEFAULT_DEBIT_ORIGIN,
        }
    }
}

impl fmt::Display for FundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" | "add" => Ok(FundKind::Credit),
            "debit" | "withdraw" => Ok(FundKind::Debit),
            other => Err(CoreError::InvalidFundKind(other.to_string())),
        }
    }
}

/// A validated fund entry waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFundEntry {
    pub kind: FundKind,
    pub amount: Amount,
    pub note: String,
    pub origin: String,
}

/// One persisted ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundEntry {
    pub id: EntryId,
    pub kind: FundKind,
    /// Always positive.
    pub amount: Amount,
    /// Free-text reason, never empty.
    pub note: String,
    /// Informational tag such as `manual-credit` or `expense`.
    pub origin: String,
    /// Unix ms, set at creation.
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_accepts_legacy_names() {
        assert_eq!("add".parse::<FundKind>().unwrap(), FundKind::Credit);
        assert_eq!("withdraw".parse::<FundKind>().unwrap(), FundKind::Debit);
        assert_eq!("credit".parse::<FundKind>().unwrap(), FundKind::Credit);
        assert!("refund".parse::<FundKind>().is_err());
    }
}
