//! # Gatepass
//!
//! Event check-in and ledger engine: issue QR entry passes, sell them to
//! named holders, admit each holder exactly once at the gate, and reconcile
//! cash on hand against ticket revenue.
//!
//! ## Overview
//!
//! - **Generation**: batches of tokens with 64-bit random codes, unique for
//!   the life of the store
//! - **Assignment**: bind a token to a holder and price, at most once
//! - **Redemption**: admit an assigned token at the gate, at most once
//! - **Ledger**: append-only credits and debits
//! - **Reconciliation**: `collected + credits - debits`
//!
//! ## Key Concepts
//!
//! - **Token**: `Created` → `Assigned` → `Entered`. Transitions never go
//!   back, except the explicit bulk `reset_entries`.
//! - **Outcome**: conflicts (already assigned, already entered, unpaid,
//!   none left) are ordinary result variants, not errors.
//! - **Caller**: every operation takes the caller's role explicitly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gatepass::{AssignRequest, Gatepass, GatepassConfig};
//! use gatepass::perms::Caller;
//! use gatepass::store::SqliteStore;
//!
//! async fn example() -> gatepass::Result<()> {
//!     let store = SqliteStore::open("gatepass.db")?;
//!     let desk = Gatepass::new(store, GatepassConfig::from_env());
//!     let admin = Caller::main_admin();
//!
//!     desk.generate_batch(&admin, 100).await?;
//!
//!     let request = AssignRequest::new("Asha", "21CS001", None)?;
//!     let sold = desk.assign_next(&admin, request).await?;
//!     if let Some(pass) = sold.pass() {
//!         // Render `pass.reference.url` as a QR code.
//!         let at_gate = desk.redeem(&Caller::Anonymous, &pass.reference.url).await?;
//!         println!("{}", at_gate);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `gatepass::core` - Records, codes and input validation
//! - `gatepass::store` - Storage abstraction, SQLite and in-memory backends
//! - `gatepass::perms` - Roles and the access policy

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod outcome;
pub mod reconcile;
pub mod reference;

pub use config::{GatepassConfig, GenerationPolicy, DEFAULT_BASE_URL, DEFAULT_PRICE};
pub use engine::Gatepass;
pub use error::{GatepassError, Result};
pub use lifecycle::{TokenFilter, TokenStats};
pub use outcome::{
    AssignNextOutcome, AssignOutcome, BatchReport, IssuedPass, LookupOutcome, RedeemOutcome,
};
pub use reconcile::Balance;
pub use reference::RedemptionRef;

// Re-export component crates
pub use gatepass_core as core;
pub use gatepass_perms as perms;
pub use gatepass_store as store;

// Re-export commonly used types
pub use gatepass_core::{
    Amount, AssignRequest, FundEntry, FundKind, FundRequest, Holder, Token, TokenCode, TokenId,
    TokenState,
};
pub use gatepass_perms::{Caller, Role};
pub use gatepass_store::{MemoryStore, SqliteStore, Store};
