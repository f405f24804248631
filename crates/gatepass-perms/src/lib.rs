//! # Gatepass Permissions
//!
//! Roles and the per-operation access policy.
//!
//! ## Overview
//!
//! Gatepass never reads identity from ambient request state. The host
//! authenticates a request however it likes and hands the engine an
//! explicit [`Caller`]. Every facade operation then checks its [`Action`]
//! against [`authorize`] before touching input or storage.
//!
//! ## Policy
//!
//! | Action | Allowed |
//! |---|---|
//! | `Redeem` | anyone, including anonymous gate scanners |
//! | `CheckToken`, `ViewLedger` | any authenticated role |
//! | everything else | `main_admin` |
//!
//! ## Usage
//!
//! ```rust
//! use gatepass_perms::{authorize, Action, Caller, Role};
//!
//! let scanner = Caller::Authenticated(Role::Scanner);
//! assert!(authorize(&scanner, Action::Redeem).is_ok());
//! assert!(authorize(&scanner, Action::AssignToken).is_err());
//! ```

pub mod error;
pub mod policy;
pub mod role;

pub use error::{PermsError, Result};
pub use policy::{authorize, Action};
pub use role::{Caller, Role};
