//! Test fixtures and helpers.
//!
//! Common setup code for integration tests. Helpers panic on unexpected
//! results so tests can stay linear.

use gatepass::{
    AssignNextOutcome, AssignRequest, FundRequest, Gatepass, GatepassConfig, IssuedPass,
    RedeemOutcome,
};
use gatepass_core::{CodeSource, OsCodeSource, TokenCode};
use gatepass_perms::Caller;
use gatepass_store::MemoryStore;

/// Install a `tracing` subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An engine over a fresh in-memory store, plus a main admin caller.
pub struct TestDesk {
    pub engine: Gatepass<MemoryStore>,
    pub admin: Caller,
}

impl TestDesk {
    /// Default configuration, OS random codes.
    pub fn new() -> Self {
        Self::with_config(GatepassConfig::default())
    }

    pub fn with_config(config: GatepassConfig) -> Self {
        Self::with_parts(config, OsCodeSource)
    }

    pub fn with_parts(config: GatepassConfig, codes: impl CodeSource + 'static) -> Self {
        init_tracing();
        Self {
            engine: Gatepass::with_code_source(MemoryStore::new(), config, codes),
            admin: Caller::main_admin(),
        }
    }

    /// Generate `count` tokens and return their codes.
    pub async fn generate(&self, count: u32) -> Vec<TokenCode> {
        self.engine
            .generate_batch(&self.admin, count)
            .await
            .expect("generate batch")
            .codes
    }

    /// Sell the next free token to `name`. A zero price means "use default".
    pub async fn sell(&self, name: &str, price: u64) -> IssuedPass {
        let request = AssignRequest::new(name, &format!("{}-roll", name), Some(price))
            .expect("valid holder");
        match self
            .engine
            .assign_next(&self.admin, request)
            .await
            .expect("assign next")
        {
            AssignNextOutcome::Assigned(pass) => pass,
            AssignNextOutcome::NoTokensLeft => panic!("no tokens left to sell to {}", name),
        }
    }

    /// Scan a code at the gate as an anonymous scanner.
    pub async fn scan(&self, code: &TokenCode) -> RedeemOutcome {
        self.engine
            .redeem(&Caller::Anonymous, &code.to_hex())
            .await
            .expect("redeem")
    }

    pub async fn credit(&self, amount: u64, note: &str) {
        let request = FundRequest::credit(amount, note).expect("valid credit");
        self.engine
            .record_fund(&self.admin, request)
            .await
            .expect("record credit");
    }

    pub async fn debit(&self, amount: u64, note: &str) {
        let request = FundRequest::debit(amount, note).expect("valid debit");
        self.engine
            .record_fund(&self.admin, request)
            .await
            .expect("record debit");
    }
}

impl Default for TestDesk {
    fn default() -> Self {
        Self::new()
    }
}
