//! # Gatepass Store
//!
//! Persistence for Gatepass tokens and ledger entries. Provides a trait-based
//! interface with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The [`Store`] trait is the only shared mutable resource of the system.
//! Every lifecycle transition is expressed as one atomic conditional update
//! ("set assigned only if it was unassigned", "set entered only if it was
//! assigned and not yet entered"), so concurrent requests on the same token
//! behave as if a lock guarded the record, without the engine taking one.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ClaimResult`] / [`EnterResult`] - Outcomes of the conditional updates
//! - [`BatchInsert`] - Outcome of a bulk code insert
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gatepass_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("gatepass.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let counts = store.count_tokens().await.unwrap();
//!     assert_eq!(counts.total, 0);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Unique codes**: a duplicate code in a batch is reported back, not inserted
//! - **Guarded transitions**: the guard lives in the update itself
//! - **Append-only ledger**: fund entries have no update or delete path

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{BatchInsert, ClaimResult, EnterResult, FundTotals, Store, TokenCounts};
