//! The engine: one handle over storage, configuration and the code source.
//!
//! Operations live in sibling modules as further `impl` blocks:
//! `lifecycle` for tokens, `ledger` for fund entries and `reconcile` for
//! the balance query.

use std::sync::Arc;

use gatepass_core::{CodeSource, OsCodeSource, TokenCode};
use gatepass_perms::{authorize, Action, Caller};
use gatepass_store::Store;

use crate::config::GatepassConfig;
use crate::error::Result;
use crate::reference::RedemptionRef;

/// The main engine struct.
///
/// Provides a unified API for:
/// - Generating token batches
/// - Assigning tokens to holders
/// - Redeeming tokens at the gate
/// - Recording fund movements
/// - Reconciling funds against token revenue
///
/// Every operation takes the [`Caller`] explicitly and checks it before
/// anything else. The engine holds no per-token state of its own, so it can
/// be shared across tasks behind an `Arc`.
pub struct Gatepass<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: GatepassConfig,
    /// Where candidate codes come from.
    codes: Box<dyn CodeSource>,
}

impl<S: Store> Gatepass<S> {
    /// Create a new engine drawing codes from the OS CSPRNG.
    pub fn new(store: S, config: GatepassConfig) -> Self {
        Self::with_code_source(store, config, OsCodeSource)
    }

    /// Create an engine with a custom code source.
    pub fn with_code_source(
        store: S,
        config: GatepassConfig,
        codes: impl CodeSource + 'static,
    ) -> Self {
        Self {
            store: Arc::new(store),
            config: config.normalized(),
            codes: Box::new(codes),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the active configuration.
    pub fn config(&self) -> &GatepassConfig {
        &self.config
    }

    /// The scannable reference for a code under the configured base URL.
    pub fn redemption_reference(&self, code: &TokenCode) -> RedemptionRef {
        RedemptionRef::new(&self.config.base_url, *code)
    }

    pub(crate) fn code_source(&self) -> &dyn CodeSource {
        self.codes.as_ref()
    }

    /// Run the access policy, logging refusals.
    pub(crate) fn check(&self, caller: &Caller, action: Action) -> Result<()> {
        authorize(caller, action).map_err(|err| {
            tracing::warn!(caller = %caller, action = %action, "permission denied");
            err.into()
        })
    }
}
