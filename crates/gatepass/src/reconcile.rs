//! Reconciliation: how much money should exist right now.
//!
//! ```text
//! total_funds = total_collected + total_credits - total_debits
//! ```
//!
//! `total_collected` sums the price of every token regardless of state, so
//! a sold pass counts as revenue before its holder reaches the gate. The
//! token and ledger sums are separate reads and may come from slightly
//! different moments under concurrent writes.

use serde::{Deserialize, Serialize};

use gatepass_core::{Amount, FundEntry};
use gatepass_perms::{Action, Caller};
use gatepass_store::{FundTotals, Store};

use crate::engine::Gatepass;
use crate::error::{GatepassError, Result};

/// Current balance and the ledger behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    /// Negative when more was withdrawn than collected and credited.
    pub total_funds: i64,
    pub total_collected: Amount,
    pub total_credits: Amount,
    pub total_debits: Amount,
    /// Every fund entry, newest first.
    pub transactions: Vec<FundEntry>,
}

impl Balance {
    pub fn compute(
        collected: Amount,
        totals: FundTotals,
        transactions: Vec<FundEntry>,
    ) -> Result<Self> {
        let funds = i128::from(collected.units()) + i128::from(totals.credits.units())
            - i128::from(totals.debits.units());
        let total_funds =
            i64::try_from(funds).map_err(|_| GatepassError::BalanceOutOfRange(funds))?;

        Ok(Self {
            total_funds,
            total_collected: collected,
            total_credits: totals.credits,
            total_debits: totals.debits,
            transactions,
        })
    }
}

impl<S: Store> Gatepass<S> {
    /// Read the reconciled balance. No side effects.
    pub async fn current_balance(&self, caller: &Caller) -> Result<Balance> {
        self.check(caller, Action::ViewLedger)?;

        let collected = self.store().sum_token_prices().await?;
        let totals = self.store().fund_totals().await?;
        let transactions = self.store().list_fund_entries().await?;

        tracing::debug!(entries = transactions.len(), "balance read");
        Balance::compute(collected, totals, transactions)
    }
}
