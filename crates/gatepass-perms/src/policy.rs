//! The access policy: which callers may perform which actions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PermsError, Result};
use crate::role::{Caller, Role};

/// Every operation the engine exposes, as seen by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    GenerateTokens,
    AssignToken,
    CheckToken,
    ListTokens,
    SetPrice,
    ResetEntries,
    ViewLedger,
    RecordFund,
    Redeem,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::GenerateTokens,
        Action::AssignToken,
        Action::CheckToken,
        Action::ListTokens,
        Action::SetPrice,
        Action::ResetEntries,
        Action::ViewLedger,
        Action::RecordFund,
        Action::Redeem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GenerateTokens => "generate tokens",
            Action::AssignToken => "assign tokens",
            Action::CheckToken => "check tokens",
            Action::ListTokens => "list tokens",
            Action::SetPrice => "set prices",
            Action::ResetEntries => "reset entries",
            Action::ViewLedger => "view the ledger",
            Action::RecordFund => "record funds",
            Action::Redeem => "redeem tokens",
        }
    }

    /// The minimum requirement for this action.
    fn requirement(&self) -> Requirement {
        match self {
            Action::Redeem => Requirement::Anyone,
            Action::CheckToken | Action::ViewLedger => Requirement::Authenticated,
            _ => Requirement::Role(Role::MainAdmin),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Requirement {
    Anyone,
    Authenticated,
    Role(Role),
}

/// Check whether `caller` may perform `action`.
pub fn authorize(caller: &Caller, action: Action) -> Result<()> {
    match (action.requirement(), caller) {
        (Requirement::Anyone, _) => Ok(()),
        (_, Caller::Anonymous) => Err(PermsError::Unauthenticated(action)),
        (Requirement::Authenticated, Caller::Authenticated(_)) => Ok(()),
        (Requirement::Role(needed), Caller::Authenticated(role)) if *role == needed => Ok(()),
        (Requirement::Role(_), Caller::Authenticated(role)) => Err(PermsError::Forbidden {
            role: *role,
            action,
        }),
    }
}
