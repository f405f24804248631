//! Store trait: the abstract interface for token and ledger persistence.
//!
//! This trait allows the engine to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use std::sync::Arc;

use async_trait::async_trait;
use gatepass_core::{Amount, Assignment, FundEntry, NewFundEntry, Token, TokenCode, TokenId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Result of inserting a batch of freshly drawn codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInsert {
    /// The batch was written.
    Inserted {
        /// Newly created tokens, in insertion order.
        tokens: Vec<Token>,
        /// Codes that collided with an existing token and were skipped.
        duplicates: Vec<TokenCode>,
    },
    /// `require_empty` was set and the store already holds tokens.
    /// Nothing was written.
    StoreNotEmpty {
        /// How many tokens already exist.
        existing: u64,
    },
}

/// Result of conditionally assigning a specific token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResult {
    /// The token was unassigned and now carries the assignment.
    Claimed(Token),
    /// No token has this code.
    NotFound,
    /// The token was already assigned (and not entered). Unchanged.
    AlreadyAssigned(Token),
    /// The token was already redeemed at the gate. Unchanged.
    AlreadyEntered(Token),
}

/// Result of conditionally marking a token as entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterResult {
    /// The token was assigned and not yet entered; it is now entered.
    Entered(Token),
    /// No token has this code.
    NotFound,
    /// The token exists but was never assigned. Unchanged.
    NotAssigned(Token),
    /// The token was already entered. Unchanged, original `entered_at` kept.
    AlreadyEntered(Token),
}

/// Token counts by lifecycle state.
///
/// `assigned` counts tokens that are assigned but not yet entered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCounts {
    pub total: u64,
    pub unassigned: u64,
    pub assigned: u64,
    pub entered: u64,
}

/// Sum of ledger amounts by direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FundTotals {
    pub credits: Amount,
    pub debits: Amount,
}

/// The Store trait: async interface for token and ledger persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic transitions**: `claim_token`, `claim_next` and `mark_entered`
///   must each be a single conditional update. Two concurrent calls on the
///   same token can never both succeed.
/// - **No partial writes**: a failed call leaves every record as it was.
/// - **Bulk writes**: `insert_tokens` and `reset_entries` run as one
///   transaction each.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Token Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert new unassigned tokens for the given codes.
    ///
    /// Codes that already exist are reported in `duplicates` and skipped.
    /// With `require_empty`, the emptiness check and the insert happen in
    /// the same transaction.
    async fn insert_tokens(&self, codes: &[TokenCode], require_empty: bool) -> Result<BatchInsert>;

    /// Get a token by its store id.
    async fn get_token(&self, id: TokenId) -> Result<Option<Token>>;

    /// Get a token by its redemption code.
    async fn get_token_by_code(&self, code: &TokenCode) -> Result<Option<Token>>;

    /// All tokens, ordered by id.
    async fn list_tokens(&self) -> Result<Vec<Token>>;

    /// Count tokens by lifecycle state.
    async fn count_tokens(&self) -> Result<TokenCounts>;

    /// Assign the token with `code` if, and only if, it is unassigned.
    async fn claim_token(
        &self,
        code: &TokenCode,
        assignment: &Assignment,
        now: i64,
    ) -> Result<ClaimResult>;

    /// Assign one arbitrary unassigned token. `None` when none are left.
    async fn claim_next(&self, assignment: &Assignment, now: i64) -> Result<Option<Token>>;

    /// Mark the token with `code` as entered if, and only if, it is
    /// assigned and not yet entered.
    async fn mark_entered(&self, code: &TokenCode, now: i64) -> Result<EnterResult>;

    /// Overwrite a token's price regardless of state. `None` if unknown id.
    async fn set_price(&self, id: TokenId, price: Amount) -> Result<Option<Token>>;

    /// Clear `entered_at` on every token, leaving assignments untouched.
    ///
    /// Returns the number of tokens that were entered before the reset.
    async fn reset_entries(&self) -> Result<u64>;

    /// Sum of `price` over all tokens, regardless of state.
    async fn sum_token_prices(&self) -> Result<Amount>;

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append an immutable fund entry.
    async fn append_fund_entry(&self, entry: &NewFundEntry, now: i64) -> Result<FundEntry>;

    /// All fund entries, newest first (ties broken by id, newest first).
    async fn list_fund_entries(&self) -> Result<Vec<FundEntry>>;

    /// Sum of credits and of debits.
    async fn fund_totals(&self) -> Result<FundTotals>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn insert_tokens(&self, codes: &[TokenCode], require_empty: bool) -> Result<BatchInsert> {
        (**self).insert_tokens(codes, require_empty).await
    }

    async fn get_token(&self, id: TokenId) -> Result<Option<Token>> {
        (**self).get_token(id).await
    }

    async fn get_token_by_code(&self, code: &TokenCode) -> Result<Option<Token>> {
        (**self).get_token_by_code(code).await
    }

    async fn list_tokens(&self) -> Result<Vec<Token>> {
        (**self).list_tokens().await
    }

    async fn count_tokens(&self) -> Result<TokenCounts> {
        (**self).count_tokens().await
    }

    async fn claim_token(
        &self,
        code: &TokenCode,
        assignment: &Assignment,
        now: i64,
    ) -> Result<ClaimResult> {
        (**self).claim_token(code, assignment, now).await
    }

    async fn claim_next(&self, assignment: &Assignment, now: i64) -> Result<Option<Token>> {
        (**self).claim_next(assignment, now).await
    }

    async fn mark_entered(&self, code: &TokenCode, now: i64) -> Result<EnterResult> {
        (**self).mark_entered(code, now).await
    }

    async fn set_price(&self, id: TokenId, price: Amount) -> Result<Option<Token>> {
        (**self).set_price(id, price).await
    }

    async fn reset_entries(&self) -> Result<u64> {
        (**self).reset_entries().await
    }

    async fn sum_token_prices(&self) -> Result<Amount> {
        (**self).sum_token_prices().await
    }

    async fn append_fund_entry(&self, entry: &NewFundEntry, now: i64) -> Result<FundEntry> {
        (**self).append_fund_entry(entry, now).await
    }

    async fn list_fund_entries(&self) -> Result<Vec<FundEntry>> {
        (**self).list_fund_entries().await
    }

    async fn fund_totals(&self) -> Result<FundTotals> {
        (**self).fund_totals().await
    }
}

/// Classify a token that a guarded assignment did not change.
pub(crate) fn unclaimed(token: Token) -> ClaimResult {
    if token.is_entered() {
        ClaimResult::AlreadyEntered(token)
    } else {
        ClaimResult::AlreadyAssigned(token)
    }
}

/// Classify a token that a guarded entry did not change.
pub(crate) fn unentered(token: Token) -> EnterResult {
    if !token.is_assigned() {
        EnterResult::NotAssigned(token)
    } else {
        EnterResult::AlreadyEntered(token)
    }
}
