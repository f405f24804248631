//! Ledger writes and reconciliation.

use gatepass::core::ValidationError;
use gatepass::{
    Amount, Caller, FundKind, FundRequest, Gatepass, GatepassConfig, GatepassError, MemoryStore,
    Role, SqliteStore,
};
use gatepass_testkit::{all_scenarios, run_scenario, TestDesk};

#[tokio::test]
async fn test_balance_example() -> anyhow::Result<()> {
    let desk = TestDesk::new();
    desk.generate(4).await;
    for name in ["A", "B", "C"] {
        desk.sell(name, 400).await;
    }

    let sponsor = desk
        .engine
        .record_fund(&desk.admin, FundRequest::credit(500, "sponsor")?)
        .await?;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let decorations = desk
        .engine
        .record_fund(&desk.admin, FundRequest::debit(200, "decorations")?)
        .await?;

    let balance = desk.engine.current_balance(&desk.admin).await?;
    assert_eq!(balance.total_collected.units(), 1200);
    assert_eq!(balance.total_credits.units(), 500);
    assert_eq!(balance.total_debits.units(), 200);
    assert_eq!(balance.total_funds, 1500);

    let ids: Vec<_> = balance.transactions.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![decorations.id, sponsor.id]);
    assert_eq!(sponsor.origin, "manual-credit");
    assert_eq!(decorations.origin, "expense");
    Ok(())
}

#[tokio::test]
async fn test_invalid_fund_requests_append_nothing() -> anyhow::Result<()> {
    let desk = TestDesk::new();

    assert!(FundRequest::credit(0, "x").is_err());
    assert!(FundRequest::credit(50, "").is_err());

    let balance = desk.engine.current_balance(&desk.admin).await?;
    assert!(balance.transactions.is_empty());
    assert_eq!(balance.total_funds, 0);
    Ok(())
}

#[test]
fn test_unstorable_amounts_fail_validation() {
    assert!(matches!(
        FundRequest::credit(1 << 63, "windfall"),
        Err(ValidationError::AmountTooLarge { .. })
    ));
    assert!(FundRequest::credit(Amount::MAX.units(), "windfall").is_ok());
}

#[tokio::test]
async fn test_largest_amount_round_trips_through_sqlite() -> anyhow::Result<()> {
    let engine = Gatepass::new(SqliteStore::open_memory()?, GatepassConfig::default());
    let admin = Caller::main_admin();
    let max = Amount::MAX.units();

    engine.record_fund(&admin, FundRequest::credit(max, "windfall")?).await?;
    engine.record_fund(&admin, FundRequest::debit(max - 5, "refund")?).await?;

    let balance = engine.current_balance(&admin).await?;
    assert_eq!(balance.total_funds, 5);
    Ok(())
}

#[tokio::test]
async fn test_overflowing_totals_are_reported() -> anyhow::Result<()> {
    let engine = Gatepass::new(MemoryStore::new(), GatepassConfig::default());
    let admin = Caller::main_admin();
    for _ in 0..3 {
        engine
            .record_fund(&admin, FundRequest::credit(Amount::MAX.units(), "windfall")?)
            .await?;
    }

    assert!(engine.current_balance(&admin).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_custom_origin_and_entry_fields() -> anyhow::Result<()> {
    let desk = TestDesk::new();
    let request = FundRequest::new(FundKind::Credit, 750, "  alumni gift ", Some("sponsor"))?;
    let entry = desk.engine.record_fund(&desk.admin, request).await?;

    assert_eq!(entry.kind, FundKind::Credit);
    assert_eq!(entry.note, "alumni gift");
    assert_eq!(entry.origin, "sponsor");
    assert!(entry.created_at > 0);
    Ok(())
}

#[tokio::test]
async fn test_ledger_permissions() -> anyhow::Result<()> {
    let desk = TestDesk::new();
    let scanner = Caller::from(Role::Scanner);

    let refused = desk
        .engine
        .record_fund(&scanner, FundRequest::credit(10, "tip")?)
        .await;
    assert!(matches!(refused, Err(GatepassError::Permission(_))));

    assert!(desk.engine.current_balance(&scanner).await.is_ok());
    assert!(matches!(
        desk.engine.current_balance(&Caller::Anonymous).await,
        Err(GatepassError::Permission(_))
    ));
    assert!(desk.engine.current_balance(&desk.admin).await?.transactions.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reconciliation_scenarios() {
    for scenario in all_scenarios() {
        let balance = run_scenario(&scenario).await;
        assert_eq!(balance.total_funds, scenario.total_funds, "{}", scenario.name);
    }
}

#[tokio::test]
async fn test_balance_serializes_for_clients() -> anyhow::Result<()> {
    let desk = TestDesk::new();
    desk.credit(500, "sponsor").await;

    let balance = desk.engine.current_balance(&desk.admin).await?;
    let json = serde_json::to_value(&balance)?;
    assert_eq!(json["total_funds"], 500);
    assert_eq!(json["transactions"][0]["kind"], "credit");
    assert_eq!(json["transactions"][0]["amount"], 500);
    Ok(())
}

mod properties {
    use super::*;
    use gatepass_testkit::generators::{blank, fund_kind, fund_request};
    use proptest::collection::vec;
    use proptest::prelude::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(future)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_balance_is_signed_sum(requests in vec(fund_request(), 0..12)) {
            let expected: i64 = requests
                .iter()
                .map(|r| match r.entry().kind {
                    FundKind::Credit => r.entry().amount.units() as i64,
                    FundKind::Debit => -(r.entry().amount.units() as i64),
                })
                .sum();

            let desk = TestDesk::new();
            let count = requests.len();
            let balance = block_on(async {
                for request in requests {
                    desk.engine.record_fund(&desk.admin, request).await.unwrap();
                }
                desk.engine.current_balance(&desk.admin).await.unwrap()
            });

            prop_assert_eq!(balance.total_funds, expected);
            prop_assert_eq!(balance.transactions.len(), count);
        }

        #[test]
        fn prop_blank_note_rejected(kind in fund_kind(), note in blank()) {
            prop_assert_eq!(
                FundRequest::new(kind, 10, &note, None),
                Err(ValidationError::MissingField("note"))
            );
        }
    }
}
