//! # Gatepass Testkit
//!
//! Testing utilities for Gatepass.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a ready engine over an in-memory store with a main admin
//!   caller and helpers to sell and admit passes
//! - **Code sources**: deterministic and scripted code sources for
//!   collision tests
//! - **Generators**: Proptest strategies for property-based testing
//! - **Scenarios**: reconciliation cases with known expected balances
//!
//! ## Test Fixtures
//!
//! ```rust
//! use gatepass_testkit::TestDesk;
//!
//! let desk = TestDesk::new();
//! assert_eq!(desk.engine.config().default_price.units(), 400);
//! ```
//!
//! ## Scenarios
//!
//! ```rust
//! use gatepass_testkit::scenarios::all_scenarios;
//!
//! for scenario in all_scenarios() {
//!     assert_eq!(scenario.expected_total_funds(), scenario.total_funds);
//! }
//! ```

pub mod codes;
pub mod fixtures;
pub mod generators;
pub mod scenarios;

pub use codes::{ScriptedCodeSource, SeededCodeSource, StuckCodeSource};
pub use fixtures::{init_tracing, TestDesk};
pub use scenarios::{all_scenarios, run_scenario, Scenario};
