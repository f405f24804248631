//! Ledger writes.

use gatepass_core::{now_millis, FundEntry, FundRequest};
use gatepass_perms::{Action, Caller};
use gatepass_store::Store;

use crate::engine::Gatepass;
use crate::error::Result;

impl<S: Store> Gatepass<S> {
    /// Append one immutable fund entry stamped with the current time.
    pub async fn record_fund(&self, caller: &Caller, request: FundRequest) -> Result<FundEntry> {
        self.check(caller, Action::RecordFund)?;

        let entry = self
            .store()
            .append_fund_entry(request.entry(), now_millis())
            .await?;

        tracing::info!(
            id = %entry.id,
            kind = %entry.kind,
            amount = %entry.amount,
            origin = %entry.origin,
            "fund entry recorded"
        );
        Ok(entry)
    }
}
