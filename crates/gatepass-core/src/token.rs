//! Token records and their lifecycle state.
//!
//! A token moves one way through three states:
//!
//! ```text
//! Created ──assign──▶ Assigned ──redeem──▶ Entered
//!                         ▲                   │
//!                         └──── reset_entries ┘
//! ```
//!
//! The reset edge is a bulk administrative operation, never part of the
//! gate-scan path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{Amount, TokenCode, TokenId};

/// Lifecycle state of a token, derived from its timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// Code exists, no holder bound.
    Created,
    /// Holder bound and price set.
    Assigned,
    /// Redeemed at the gate. Terminal on the scan path.
    Entered,
}

impl TokenState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenState::Created => "created",
            TokenState::Assigned => "assigned",
            TokenState::Entered => "entered",
        }
    }
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" | "unassigned" => Ok(TokenState::Created),
            "assigned" => Ok(TokenState::Assigned),
            "entered" => Ok(TokenState::Entered),
            other => Err(CoreError::InvalidTokenState(other.to_string())),
        }
    }
}

/// The person a token was sold to. Immutable once bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Holder {
    pub name: String,
    pub roll: String,
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.roll)
    }
}

/// The values written by a successful assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub holder: Holder,
    /// Final price, with any configured default already applied.
    pub price: Amount,
}

/// One issued entry pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub code: TokenCode,
    /// Bound at first successful assignment; `None` while unassigned.
    pub holder: Option<Holder>,
    pub price: Amount,
    /// Unix ms of the first successful assignment.
    pub assigned_at: Option<i64>,
    /// Unix ms of the first successful redemption since the last reset.
    pub entered_at: Option<i64>,
}

impl Token {
    /// A freshly generated, unassigned token.
    pub fn new(id: TokenId, code: TokenCode) -> Self {
        Self {
            id,
            code,
            holder: None,
            price: Amount::ZERO,
            assigned_at: None,
            entered_at: None,
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_at.is_some()
    }

    pub fn is_entered(&self) -> bool {
        self.entered_at.is_some()
    }

    pub fn state(&self) -> TokenState {
        if self.is_entered() {
            TokenState::Entered
        } else if self.is_assigned() {
            TokenState::Assigned
        } else {
            TokenState::Created
        }
    }

    /// Holder name, or `"Unknown"` for a record that never had one.
    pub fn holder_name(&self) -> &str {
        self.holder
            .as_ref()
            .map(|h| h.name.as_str())
            .unwrap_or("Unknown")
    }

    /// Check the record-level invariants:
    /// a holder is bound iff `assigned_at` is set, and entry implies assignment.
    pub fn is_consistent(&self) -> bool {
        let holder_matches = self.holder.is_some() == self.assigned_at.is_some();
        let entry_needs_assignment = !self.is_entered() || self.is_assigned();
        holder_matches && entry_needs_assignment
    }
}
