//! Proptest generators for property-based testing.

use proptest::prelude::*;

use gatepass_core::{
    Amount, AssignRequest, FundKind, FundRequest, TokenCode, CODE_BYTES, MAX_BATCH_SIZE,
};

/// Generate a random TokenCode.
pub fn token_code() -> impl Strategy<Value = TokenCode> {
    any::<[u8; CODE_BYTES]>().prop_map(TokenCode::from_bytes)
}

/// Generate a plausible holder name.
pub fn holder_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,12}( [A-Z][a-z]{1,12})?"
}

/// Generate a plausible roll number.
pub fn roll() -> impl Strategy<Value = String> {
    "[0-9]{2}[A-Z]{2}[0-9]{3}"
}

/// Generate a price, including zero (meaning "use the default").
pub fn price() -> impl Strategy<Value = u64> {
    prop_oneof![Just(0u64), 1u64..=5_000]
}

/// Generate a valid AssignRequest.
pub fn assign_request() -> impl Strategy<Value = AssignRequest> {
    (holder_name(), roll(), proptest::option::of(price())).prop_map(|(name, roll, price)| {
        AssignRequest::new(&name, &roll, price).unwrap_or_else(|e| panic!("{}", e))
    })
}

/// Generate a string that trims to nothing.
pub fn blank() -> impl Strategy<Value = String> {
    "[ \t\r\n]{0,6}"
}

/// Generate a FundKind.
pub fn fund_kind() -> impl Strategy<Value = FundKind> {
    prop_oneof![Just(FundKind::Credit), Just(FundKind::Debit)]
}

/// Generate a valid FundRequest.
pub fn fund_request() -> impl Strategy<Value = FundRequest> {
    (fund_kind(), 1u64..=100_000, "[a-z]{1,10}( [a-z]{1,10})?").prop_map(
        |(kind, amount, note)| {
            FundRequest::new(kind, amount, &note, None).unwrap_or_else(|e| panic!("{}", e))
        },
    )
}

/// Generate an in-range batch size.
pub fn batch_size() -> impl Strategy<Value = u32> {
    1u32..=64
}

/// Generate a batch size the engine must reject.
pub fn invalid_batch_size() -> impl Strategy<Value = u32> {
    prop_oneof![Just(0u32), (MAX_BATCH_SIZE + 1)..=u32::MAX]
}

/// Generate a non-negative amount.
pub fn amount() -> impl Strategy<Value = Amount> {
    (0u64..=1_000_000).prop_map(Amount)
}
