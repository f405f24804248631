//! Error types for the permissions module.

use thiserror::Error;

use crate::policy::Action;
use crate::role::Role;

/// Errors that can occur during permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The action needs an authenticated caller.
    #[error("authentication required for {0}")]
    Unauthenticated(Action),

    /// The caller's role may not perform the action.
    #[error("role {role} may not {action}")]
    Forbidden { role: Role, action: Action },

    /// A role name outside the closed set.
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
