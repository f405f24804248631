//! Token lifecycle: generate, assign, redeem, inspect.
//!
//! Each transition is delegated to a single guarded store update. The engine
//! never reads a token, decides, and then writes it back.

use serde::{Deserialize, Serialize};

use gatepass_core::{
    now_millis, validate_amount, validate_batch_size, Amount, AssignRequest, Assignment, Token,
    TokenCode, TokenId, TokenState,
};
use gatepass_perms::{Action, Caller};
use gatepass_store::{BatchInsert, ClaimResult, EnterResult, Store, StoreError, TokenCounts};

use crate::config::GenerationPolicy;
use crate::engine::Gatepass;
use crate::error::{GatepassError, Result};
use crate::outcome::{
    AssignNextOutcome, AssignOutcome, BatchReport, IssuedPass, LookupOutcome, RedeemOutcome,
};

/// Dashboard counts. `assigned` excludes tokens that have already entered.
pub type TokenStats = TokenCounts;

/// Filter for [`Gatepass::list_tokens`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFilter {
    /// Only tokens currently in this state.
    pub state: Option<TokenState>,
    /// Case-insensitive substring of holder name, roll or code.
    pub search: Option<String>,
}

impl TokenFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: TokenState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn matches(&self, token: &Token) -> bool {
        if let Some(state) = self.state {
            if token.state() != state {
                return false;
            }
        }

        match self.search.as_deref() {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                token.code.to_hex().contains(&term)
                    || token.holder.as_ref().is_some_and(|h| {
                        h.name.to_lowercase().contains(&term)
                            || h.roll.to_lowercase().contains(&term)
                    })
            }
        }
    }
}

impl<S: Store> Gatepass<S> {
    // ─────────────────────────────────────────────────────────────────────────
    // Generation
    // ─────────────────────────────────────────────────────────────────────────

    /// Create `count` new unassigned tokens with fresh unique codes.
    ///
    /// Codes that collide with issued ones are redrawn, up to
    /// `max_code_attempts` rounds. Under the single-batch policy the call
    /// fails with `TokensAlreadyExist` if any token exists.
    pub async fn generate_batch(&self, caller: &Caller, count: u32) -> Result<BatchReport> {
        self.check(caller, Action::GenerateTokens)?;
        let count = validate_batch_size(u64::from(count), self.config().max_batch)?;

        let require_empty = self.config().generation_policy == GenerationPolicy::SingleActiveBatch;
        let max_attempts = self.config().max_code_attempts;

        let mut codes = Vec::with_capacity(count as usize);
        let mut pending = self.code_source().next_codes(count as usize);
        let mut attempt = 0;

        loop {
            attempt += 1;

            // Only the first round can race another batch; later rounds top up our own.
            let inserted = self
                .store()
                .insert_tokens(&pending, require_empty && attempt == 1)
                .await?;

            let duplicates = match inserted {
                BatchInsert::StoreNotEmpty { existing } => {
                    tracing::warn!(existing, "generation refused, tokens already exist");
                    return Err(GatepassError::TokensAlreadyExist { existing });
                }
                BatchInsert::Inserted { tokens, duplicates } => {
                    codes.extend(tokens.into_iter().map(|t| t.code));
                    duplicates
                }
            };

            if duplicates.is_empty() {
                break;
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    attempt,
                    remaining = duplicates.len(),
                    "giving up on colliding codes"
                );
                return Err(GatepassError::CodeSpaceExhausted {
                    attempts: attempt,
                    remaining: duplicates.len(),
                });
            }

            tracing::warn!(attempt, count = duplicates.len(), "redrawing colliding codes");
            pending = self.code_source().next_codes(duplicates.len());
        }

        tracing::info!(count = codes.len(), "generated token batch");

        Ok(BatchReport {
            generated: codes.len() as u32,
            codes,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Assignment
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind the token behind a scanned code to a holder.
    pub async fn assign(
        &self,
        caller: &Caller,
        raw_code: &str,
        request: AssignRequest,
    ) -> Result<AssignOutcome> {
        self.check(caller, Action::AssignToken)?;

        let Some(code) = TokenCode::from_scan(raw_code) else {
            tracing::debug!("assign with malformed code");
            return Ok(AssignOutcome::NotFound);
        };

        let assignment = self.assignment(request);
        let outcome = match self
            .store()
            .claim_token(&code, &assignment, now_millis())
            .await?
        {
            ClaimResult::Claimed(token) => {
                tracing::info!(code = %code, holder = %assignment.holder, "token assigned");
                AssignOutcome::Assigned(self.issue(token)?)
            }
            ClaimResult::NotFound => AssignOutcome::NotFound,
            ClaimResult::AlreadyEntered(token) => AssignOutcome::AlreadyEntered {
                entered_at: token.entered_at.unwrap_or_default(),
                holder: token.holder,
            },
            ClaimResult::AlreadyAssigned(token) => {
                tracing::warn!(code = %code, "token already assigned");
                AssignOutcome::AlreadyAssigned {
                    holder: token.holder,
                    price: token.price,
                }
            }
        };

        Ok(outcome)
    }

    /// Bind the lowest unassigned token to a holder.
    pub async fn assign_next(
        &self,
        caller: &Caller,
        request: AssignRequest,
    ) -> Result<AssignNextOutcome> {
        self.check(caller, Action::AssignToken)?;

        let assignment = self.assignment(request);
        match self.store().claim_next(&assignment, now_millis()).await? {
            Some(token) => {
                tracing::info!(code = %token.code, holder = %assignment.holder, "token assigned");
                Ok(AssignNextOutcome::Assigned(self.issue(token)?))
            }
            None => {
                tracing::warn!("no unassigned tokens left");
                Ok(AssignNextOutcome::NoTokensLeft)
            }
        }
    }

    fn assignment(&self, request: AssignRequest) -> Assignment {
        Assignment {
            price: request.effective_price(self.config().default_price),
            holder: request.holder,
        }
    }

    fn issue(&self, token: Token) -> Result<IssuedPass> {
        let (Some(holder), Some(assigned_at)) = (token.holder, token.assigned_at) else {
            return Err(StoreError::InvalidData(format!(
                "token {} claimed without holder",
                token.id
            ))
            .into());
        };

        Ok(IssuedPass {
            token_id: token.id,
            code: token.code,
            holder,
            price: token.price,
            assigned_at,
            reference: self.redemption_reference(&token.code),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Gate
    // ─────────────────────────────────────────────────────────────────────────

    /// Redeem a scanned code at the gate.
    pub async fn redeem(&self, caller: &Caller, raw_code: &str) -> Result<RedeemOutcome> {
        self.check(caller, Action::Redeem)?;

        let Some(code) = TokenCode::from_scan(raw_code) else {
            tracing::warn!("malformed code scanned");
            return Ok(RedeemOutcome::Invalid);
        };

        let outcome = match self.store().mark_entered(&code, now_millis()).await? {
            EnterResult::Entered(token) => {
                tracing::info!(code = %code, holder = token.holder_name(), "entry granted");
                RedeemOutcome::Granted {
                    holder_name: token.holder_name().to_string(),
                    entered_at: token.entered_at.unwrap_or_default(),
                }
            }
            EnterResult::NotFound => {
                tracing::warn!(code = %code, "unknown code scanned");
                RedeemOutcome::Invalid
            }
            EnterResult::NotAssigned(_) => {
                tracing::warn!(code = %code, "unpaid token scanned");
                RedeemOutcome::Unpaid
            }
            EnterResult::AlreadyEntered(token) => {
                tracing::warn!(code = %code, "repeat scan");
                RedeemOutcome::AlreadyEntered {
                    holder_name: token.holder_name().to_string(),
                    entered_at: token.entered_at.unwrap_or_default(),
                }
            }
        };

        Ok(outcome)
    }

    /// Inspect a scanned code without changing anything.
    pub async fn lookup(&self, caller: &Caller, raw_code: &str) -> Result<LookupOutcome> {
        self.check(caller, Action::CheckToken)?;

        let Some(code) = TokenCode::from_scan(raw_code) else {
            return Ok(LookupOutcome::Invalid);
        };

        tracing::debug!(code = %code, "token lookup");
        Ok(self
            .store()
            .get_token_by_code(&code)
            .await?
            .map_or(LookupOutcome::Invalid, LookupOutcome::from_token))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Administration
    // ─────────────────────────────────────────────────────────────────────────

    /// Overwrite a token's price, whatever its state.
    pub async fn set_price(&self, caller: &Caller, id: TokenId, price: Amount) -> Result<Token> {
        self.check(caller, Action::SetPrice)?;
        let price = validate_amount(price.units())?;

        let token = self
            .store()
            .set_price(id, price)
            .await?
            .ok_or(GatepassError::NotFound(id))?;

        tracing::info!(token = %id, price = %price, "price updated");
        Ok(token)
    }

    /// Clear entry on every token so a batch can be reused. Assignments are
    /// kept. Returns how many tokens had entered.
    pub async fn reset_entries(&self, caller: &Caller) -> Result<u64> {
        self.check(caller, Action::ResetEntries)?;

        let reset = self.store().reset_entries().await?;
        tracing::info!(count = reset, "entries reset");
        Ok(reset)
    }

    /// Tokens matching `filter`, ordered by id.
    pub async fn list_tokens(&self, caller: &Caller, filter: &TokenFilter) -> Result<Vec<Token>> {
        self.check(caller, Action::ListTokens)?;

        let tokens = self.store().list_tokens().await?;
        tracing::debug!(total = tokens.len(), "listing tokens");
        Ok(tokens.into_iter().filter(|t| filter.matches(t)).collect())
    }

    pub async fn token_stats(&self, caller: &Caller) -> Result<TokenStats> {
        self.check(caller, Action::ListTokens)?;
        Ok(self.store().count_tokens().await?)
    }
}
