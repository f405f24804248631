//! Reconciliation scenarios with known balances.
//!
//! Each scenario sells some passes, admits some holders, records ledger
//! entries and states the balance that must come out. Entry at the gate
//! never changes revenue, so `entered` is there to prove exactly that.

use gatepass::Balance;

use crate::fixtures::TestDesk;

/// One reconciliation scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name.
    pub name: &'static str,
    /// Price per sold pass. Zero means "omitted", so the default applies.
    pub sales: &'static [u64],
    /// Extra tokens generated but never sold.
    pub unsold: u32,
    /// How many of the sold passes are scanned in.
    pub entered: usize,
    pub credits: &'static [u64],
    pub debits: &'static [u64],
    /// Expected revenue from passes.
    pub total_collected: u64,
    /// Expected balance.
    pub total_funds: i64,
}

impl Scenario {
    /// Balance recomputed from the scenario's own parts, with the default
    /// price of 400 for unpriced sales.
    pub fn expected_total_funds(&self) -> i64 {
        let collected: i64 = self
            .sales
            .iter()
            .map(|p| if *p == 0 { 400 } else { *p as i64 })
            .sum();
        let credits: i64 = self.credits.iter().map(|a| *a as i64).sum();
        let debits: i64 = self.debits.iter().map(|a| *a as i64).sum();
        collected + credits - debits
    }
}

/// Get all scenarios.
pub fn all_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "sponsor credit and decoration debit",
            sales: &[400, 400, 400],
            unsold: 2,
            entered: 1,
            credits: &[500],
            debits: &[200],
            total_collected: 1200,
            total_funds: 1500,
        },
        Scenario {
            name: "empty event",
            sales: &[],
            unsold: 5,
            entered: 0,
            credits: &[],
            debits: &[],
            total_collected: 0,
            total_funds: 0,
        },
        Scenario {
            name: "default price applied to unpriced sales",
            sales: &[0, 0, 250],
            unsold: 0,
            entered: 3,
            credits: &[],
            debits: &[],
            total_collected: 1050,
            total_funds: 1050,
        },
        Scenario {
            name: "over-withdrawn ledger goes negative",
            sales: &[100],
            unsold: 0,
            entered: 0,
            credits: &[50],
            debits: &[300, 75],
            total_collected: 100,
            total_funds: -225,
        },
        Scenario {
            name: "entries do not change revenue",
            sales: &[300, 300, 300, 300],
            unsold: 1,
            entered: 4,
            credits: &[1000, 20],
            debits: &[20],
            total_collected: 1200,
            total_funds: 2200,
        },
    ]
}

/// Play a scenario against a fresh desk and return the resulting balance.
pub async fn run_scenario(scenario: &Scenario) -> Balance {
    let desk = TestDesk::new();
    let tokens = scenario.sales.len() as u32 + scenario.unsold;
    if tokens > 0 {
        desk.generate(tokens).await;
    }

    let mut passes = Vec::with_capacity(scenario.sales.len());
    for (i, price) in scenario.sales.iter().enumerate() {
        passes.push(desk.sell(&format!("holder{}", i), *price).await);
    }
    for pass in passes.iter().take(scenario.entered) {
        desk.scan(&pass.code).await;
    }

    for amount in scenario.credits {
        desk.credit(*amount, "credit").await;
    }
    for amount in scenario.debits {
        desk.debit(*amount, "debit").await;
    }

    desk.engine
        .current_balance(&desk.admin)
        .await
        .unwrap_or_else(|e| panic!("{}: {}", scenario.name, e))
}
