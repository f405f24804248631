//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use gatepass_core::{
    Amount, Assignment, EntryId, FundEntry, FundKind, NewFundEntry, Token, TokenCode, TokenId,
};

use crate::error::{Result, StoreError};
use crate::traits::{
    unclaimed, unentered, BatchInsert, ClaimResult, EnterResult, FundTotals, Store, TokenCounts,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
/// Every conditional transition holds the write lock from check to set.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    /// Tokens indexed by ID. Ordered, so "next unassigned" is the lowest id.
    tokens: BTreeMap<TokenId, Token>,

    /// Code index: code -> token id.
    by_code: HashMap<TokenCode, TokenId>,

    /// Ledger in append order.
    funds: Vec<FundEntry>,

    next_token_id: u64,
    next_entry_id: u64,
}

impl MemoryStoreInner {
    fn token_mut(&mut self, code: &TokenCode) -> Option<&mut Token> {
        let id = self.by_code.get(code)?;
        self.tokens.get_mut(id)
    }
}

fn assign(token: &mut Token, assignment: &Assignment, now: i64) {
    token.holder = Some(assignment.holder.clone());
    token.price = assignment.price;
    token.assigned_at = Some(now);
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                tokens: BTreeMap::new(),
                by_code: HashMap::new(),
                funds: Vec::new(),
                next_token_id: 1,
                next_entry_id: 1,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_tokens(&self, codes: &[TokenCode], require_empty: bool) -> Result<BatchInsert> {
        let mut inner = self.write()?;

        if require_empty && !inner.tokens.is_empty() {
            return Ok(BatchInsert::StoreNotEmpty {
                existing: inner.tokens.len() as u64,
            });
        }

        let mut tokens = Vec::with_capacity(codes.len());
        let mut duplicates = Vec::new();

        for code in codes {
            if inner.by_code.contains_key(code) {
                duplicates.push(*code);
                continue;
            }

            let id = TokenId(inner.next_token_id);
            inner.next_token_id += 1;

            let token = Token::new(id, *code);
            inner.by_code.insert(*code, id);
            inner.tokens.insert(id, token.clone());
            tokens.push(token);
        }

        Ok(BatchInsert::Inserted { tokens, duplicates })
    }

    async fn get_token(&self, id: TokenId) -> Result<Option<Token>> {
        Ok(self.read()?.tokens.get(&id).cloned())
    }

    async fn get_token_by_code(&self, code: &TokenCode) -> Result<Option<Token>> {
        let inner = self.read()?;
        Ok(inner
            .by_code
            .get(code)
            .and_then(|id| inner.tokens.get(id))
            .cloned())
    }

    async fn list_tokens(&self) -> Result<Vec<Token>> {
        Ok(self.read()?.tokens.values().cloned().collect())
    }

    async fn count_tokens(&self) -> Result<TokenCounts> {
        let inner = self.read()?;
        let mut counts = TokenCounts {
            total: inner.tokens.len() as u64,
            ..TokenCounts::default()
        };

        for token in inner.tokens.values() {
            if token.is_entered() {
                counts.entered += 1;
            } else if token.is_assigned() {
                counts.assigned += 1;
            } else {
                counts.unassigned += 1;
            }
        }

        Ok(counts)
    }

    async fn claim_token(
        &self,
        code: &TokenCode,
        assignment: &Assignment,
        now: i64,
    ) -> Result<ClaimResult> {
        let mut inner = self.write()?;

        let Some(token) = inner.token_mut(code) else {
            return Ok(ClaimResult::NotFound);
        };

        if token.is_assigned() {
            return Ok(unclaimed(token.clone()));
        }

        assign(token, assignment, now);
        Ok(ClaimResult::Claimed(token.clone()))
    }

    async fn claim_next(&self, assignment: &Assignment, now: i64) -> Result<Option<Token>> {
        let mut inner = self.write()?;

        let next = inner.tokens.values_mut().find(|t| !t.is_assigned());
        Ok(next.map(|token| {
            assign(token, assignment, now);
            token.clone()
        }))
    }

    async fn mark_entered(&self, code: &TokenCode, now: i64) -> Result<EnterResult> {
        let mut inner = self.write()?;

        let Some(token) = inner.token_mut(code) else {
            return Ok(EnterResult::NotFound);
        };

        if !token.is_assigned() || token.is_entered() {
            return Ok(unentered(token.clone()));
        }

        token.entered_at = Some(now);
        Ok(EnterResult::Entered(token.clone()))
    }

    async fn set_price(&self, id: TokenId, price: Amount) -> Result<Option<Token>> {
        let mut inner = self.write()?;
        Ok(inner.tokens.get_mut(&id).map(|token| {
            token.price = price;
            token.clone()
        }))
    }

    async fn reset_entries(&self) -> Result<u64> {
        let mut inner = self.write()?;
        let mut reset = 0;

        for token in inner.tokens.values_mut() {
            if token.entered_at.take().is_some() {
                reset += 1;
            }
        }

        Ok(reset)
    }

    async fn sum_token_prices(&self) -> Result<Amount> {
        let inner = self.read()?;
        inner
            .tokens
            .values()
            .try_fold(Amount::ZERO, |acc, t| acc.checked_add(t.price))
            .ok_or_else(|| StoreError::InvalidData("token price sum overflow".into()))
    }

    async fn append_fund_entry(&self, entry: &NewFundEntry, now: i64) -> Result<FundEntry> {
        let mut inner = self.write()?;

        let id = EntryId(inner.next_entry_id);
        inner.next_entry_id += 1;

        let stored = FundEntry {
            id,
            kind: entry.kind,
            amount: entry.amount,
            note: entry.note.clone(),
            origin: entry.origin.clone(),
            created_at: now,
        };
        inner.funds.push(stored.clone());

        Ok(stored)
    }

    async fn list_fund_entries(&self) -> Result<Vec<FundEntry>> {
        let inner = self.read()?;
        let mut entries = inner.funds.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn fund_totals(&self) -> Result<FundTotals> {
        let inner = self.read()?;
        let mut totals = FundTotals::default();

        for entry in &inner.funds {
            let total = match entry.kind {
                FundKind::Credit => &mut totals.credits,
                FundKind::Debit => &mut totals.debits,
            };
            *total = total
                .checked_add(entry.amount)
                .ok_or_else(|| StoreError::InvalidData("fund total overflow".into()))?;
        }

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepass_core::{CodeSource, Holder, OsCodeSource};
    use std::sync::Arc;

    fn assignment(name: &str) -> Assignment {
        Assignment {
            holder: Holder {
                name: name.to_string(),
                roll: "R1".to_string(),
            },
            price: Amount(400),
        }
    }

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryStore::new();
        let codes = OsCodeSource.next_codes(3);

        let result = store.insert_tokens(&codes, false).await.unwrap();
        assert!(matches!(result, BatchInsert::Inserted { ref tokens, ref duplicates }
            if tokens.len() == 3 && duplicates.is_empty()));

        let token = store.get_token_by_code(&codes[2]).await.unwrap().unwrap();
        assert_eq!(token.id, TokenId(3));
        assert_eq!(store.get_token(TokenId(3)).await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_memory_store_duplicates_and_require_empty() {
        let store = MemoryStore::new();
        let codes = OsCodeSource.next_codes(2);
        store.insert_tokens(&codes, true).await.unwrap();

        let again = store.insert_tokens(&codes[..1], false).await.unwrap();
        assert_eq!(
            again,
            BatchInsert::Inserted {
                tokens: vec![],
                duplicates: vec![codes[0]]
            }
        );

        let refused = store.insert_tokens(&OsCodeSource.next_codes(1), true).await.unwrap();
        assert_eq!(refused, BatchInsert::StoreNotEmpty { existing: 2 });
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryStore::new();
        let codes = OsCodeSource.next_codes(2);
        store.insert_tokens(&codes, false).await.unwrap();

        assert!(matches!(
            store.mark_entered(&codes[0], 1).await.unwrap(),
            EnterResult::NotAssigned(_)
        ));
        assert!(matches!(
            store.claim_token(&codes[0], &assignment("a"), 2).await.unwrap(),
            ClaimResult::Claimed(_)
        ));
        assert!(matches!(
            store.claim_token(&codes[0], &assignment("b"), 3).await.unwrap(),
            ClaimResult::AlreadyAssigned(t) if t.holder_name() == "a"
        ));
        assert!(matches!(
            store.mark_entered(&codes[0], 4).await.unwrap(),
            EnterResult::Entered(_)
        ));
        assert!(matches!(
            store.claim_token(&codes[0], &assignment("b"), 5).await.unwrap(),
            ClaimResult::AlreadyEntered(_)
        ));

        let next = store.claim_next(&assignment("c"), 6).await.unwrap().unwrap();
        assert_eq!(next.code, codes[1]);
        assert!(store.claim_next(&assignment("d"), 7).await.unwrap().is_none());

        assert_eq!(store.reset_entries().await.unwrap(), 1);
        assert_eq!(store.reset_entries().await.unwrap(), 0);
        assert_eq!(store.sum_token_prices().await.unwrap(), Amount(800));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_memory_store_concurrent_entry() {
        let store = Arc::new(MemoryStore::new());
        let code = OsCodeSource.next_code();
        store.insert_tokens(&[code], false).await.unwrap();
        store.claim_token(&code, &assignment("a"), 1).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.mark_entered(&code, 10 + i).await })
            })
            .collect();

        let mut entered = 0;
        for handle in handles {
            if let EnterResult::Entered(_) = handle.await.unwrap().unwrap() {
                entered += 1;
            }
        }
        assert_eq!(entered, 1);
    }

    #[tokio::test]
    async fn test_memory_fund_totals_overflow_is_an_error() {
        let store = MemoryStore::new();
        for amount in [u64::MAX, 5] {
            let entry = NewFundEntry {
                kind: FundKind::Credit,
                amount: Amount(amount),
                note: "gift".into(),
                origin: "sponsor".into(),
            };
            store.append_fund_entry(&entry, 1).await.unwrap();
        }

        assert!(matches!(
            store.fund_totals().await,
            Err(StoreError::InvalidData(_))
        ));
    }
}
