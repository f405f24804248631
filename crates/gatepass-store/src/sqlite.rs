//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for Gatepass. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.
//!
//! Every lifecycle transition is a single guarded `UPDATE` inside an
//! `IMMEDIATE` transaction, so the guard holds even when several processes
//! share the database file.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use gatepass_core::{
    now_millis, Amount, Assignment, EntryId, FundEntry, FundKind, Holder, NewFundEntry, Token,
    TokenCode, TokenId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{
    unclaimed, unentered, BatchInsert, ClaimResult, EnterResult, FundTotals, Store, TokenCounts,
};

const SELECT_TOKEN: &str =
    "SELECT id, code, holder_name, holder_roll, price, assigned_at, entered_at FROM tokens";

const SELECT_FUND_ENTRY: &str =
    "SELECT id, kind, amount, note, origin, created_at FROM fund_entries";

/// How long a writer waits on another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file (and missing parent directories) and runs
    /// migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection from a blocking task.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::TaskFailed(e.to_string()))?
    }
}

// Helper to convert a row to Token
fn row_to_token(row: &Row<'_>) -> rusqlite::Result<Token> {
    let id: i64 = row.get("id")?;
    let code: String = row.get("code")?;
    let holder_name: Option<String> = row.get("holder_name")?;
    let holder_roll: Option<String> = row.get("holder_roll")?;
    let price: i64 = row.get("price")?;

    let code = TokenCode::from_hex(&code)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let holder = match (holder_name, holder_roll) {
        (Some(name), Some(roll)) => Some(Holder { name, roll }),
        _ => None,
    };

    Ok(Token {
        id: TokenId(id as u64),
        code,
        holder,
        price: Amount(u64::try_from(price).map_err(|_| {
            rusqlite::Error::IntegralValueOutOfRange(4, price)
        })?),
        assigned_at: row.get("assigned_at")?,
        entered_at: row.get("entered_at")?,
    })
}

// Helper to convert a row to FundEntry
fn row_to_fund_entry(row: &Row<'_>) -> rusqlite::Result<FundEntry> {
    let id: i64 = row.get("id")?;
    let kind: String = row.get("kind")?;
    let amount: i64 = row.get("amount")?;

    let kind: FundKind = kind
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(FundEntry {
        id: EntryId(id as u64),
        kind,
        amount: Amount(
            u64::try_from(amount).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(2, amount))?,
        ),
        note: row.get("note")?,
        origin: row.get("origin")?,
        created_at: row.get("created_at")?,
    })
}

fn amount_to_sql(amount: Amount) -> Result<i64> {
    i64::try_from(amount.units())
        .map_err(|_| StoreError::InvalidData(format!("amount {} out of range", amount.units())))
}

fn sql_to_amount(value: i64) -> Result<Amount> {
    u64::try_from(value)
        .map(Amount)
        .map_err(|_| StoreError::InvalidData(format!("negative total {}", value)))
}

fn token_by_code(conn: &Connection, code: &str) -> rusqlite::Result<Option<Token>> {
    conn.query_row(
        &format!("{SELECT_TOKEN} WHERE code = ?1"),
        params![code],
        row_to_token,
    )
    .optional()
}

fn token_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Token>> {
    conn.query_row(
        &format!("{SELECT_TOKEN} WHERE id = ?1"),
        params![id],
        row_to_token,
    )
    .optional()
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_tokens(&self, codes: &[TokenCode], require_empty: bool) -> Result<BatchInsert> {
        let codes = codes.to_vec();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if require_empty {
                let existing: i64 =
                    tx.query_row("SELECT COUNT(*) FROM tokens", [], |row| row.get(0))?;
                if existing > 0 {
                    return Ok(BatchInsert::StoreNotEmpty {
                        existing: existing as u64,
                    });
                }
            }

            let now = now_millis();
            let mut tokens = Vec::with_capacity(codes.len());
            let mut duplicates = Vec::new();

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO tokens (code, created_at) VALUES (?1, ?2)
                     ON CONFLICT(code) DO NOTHING",
                )?;

                for code in &codes {
                    if stmt.execute(params![code.to_hex(), now])? == 0 {
                        duplicates.push(*code);
                    } else {
                        let id = TokenId(tx.last_insert_rowid() as u64);
                        tokens.push(Token::new(id, *code));
                    }
                }
            }

            tx.commit()?;

            if !duplicates.is_empty() {
                tracing::warn!(count = duplicates.len(), "skipped duplicate token codes");
            }

            Ok(BatchInsert::Inserted { tokens, duplicates })
        })
        .await
    }

    async fn get_token(&self, id: TokenId) -> Result<Option<Token>> {
        self.run(move |conn| Ok(token_by_id(conn, id.0 as i64)?)).await
    }

    async fn get_token_by_code(&self, code: &TokenCode) -> Result<Option<Token>> {
        let code = code.to_hex();
        self.run(move |conn| Ok(token_by_code(conn, &code)?)).await
    }

    async fn list_tokens(&self) -> Result<Vec<Token>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_TOKEN} ORDER BY id"))?;
            let tokens = stmt
                .query_map([], row_to_token)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tokens)
        })
        .await
    }

    async fn count_tokens(&self) -> Result<TokenCounts> {
        self.run(|conn| {
            let counts = conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(assigned = 0), 0),
                        COALESCE(SUM(assigned = 1 AND entered = 0), 0),
                        COALESCE(SUM(entered = 1), 0)
                 FROM tokens",
                [],
                |row| {
                    Ok(TokenCounts {
                        total: row.get::<_, i64>(0)? as u64,
                        unassigned: row.get::<_, i64>(1)? as u64,
                        assigned: row.get::<_, i64>(2)? as u64,
                        entered: row.get::<_, i64>(3)? as u64,
                    })
                },
            )?;
            Ok(counts)
        })
        .await
    }

    async fn claim_token(
        &self,
        code: &TokenCode,
        assignment: &Assignment,
        now: i64,
    ) -> Result<ClaimResult> {
        let code = code.to_hex();
        let assignment = assignment.clone();
        let price = amount_to_sql(assignment.price)?;

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let changed = tx.execute(
                "UPDATE tokens
                 SET assigned = 1, holder_name = ?2, holder_roll = ?3, price = ?4, assigned_at = ?5
                 WHERE code = ?1 AND assigned = 0",
                params![
                    code,
                    assignment.holder.name,
                    assignment.holder.roll,
                    price,
                    now
                ],
            )?;

            let token = token_by_code(&tx, &code)?;
            tx.commit()?;

            Ok(match token {
                None => ClaimResult::NotFound,
                Some(token) if changed == 1 => ClaimResult::Claimed(token),
                Some(token) => unclaimed(token),
            })
        })
        .await
    }

    async fn claim_next(&self, assignment: &Assignment, now: i64) -> Result<Option<Token>> {
        let assignment = assignment.clone();
        let price = amount_to_sql(assignment.price)?;

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let claimed: Option<i64> = tx
                .query_row(
                    "UPDATE tokens
                     SET assigned = 1, holder_name = ?1, holder_roll = ?2, price = ?3, assigned_at = ?4
                     WHERE id = (SELECT id FROM tokens WHERE assigned = 0 ORDER BY id LIMIT 1)
                       AND assigned = 0
                     RETURNING id",
                    params![assignment.holder.name, assignment.holder.roll, price, now],
                    |row| row.get(0),
                )
                .optional()?;

            let token = match claimed {
                Some(id) => token_by_id(&tx, id)?,
                None => None,
            };
            tx.commit()?;

            Ok(token)
        })
        .await
    }

    async fn mark_entered(&self, code: &TokenCode, now: i64) -> Result<EnterResult> {
        let code = code.to_hex();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let changed = tx.execute(
                "UPDATE tokens SET entered = 1, entered_at = ?2
                 WHERE code = ?1 AND assigned = 1 AND entered = 0",
                params![code, now],
            )?;

            let token = token_by_code(&tx, &code)?;
            tx.commit()?;

            Ok(match token {
                None => EnterResult::NotFound,
                Some(token) if changed == 1 => EnterResult::Entered(token),
                Some(token) => unentered(token),
            })
        })
        .await
    }

    async fn set_price(&self, id: TokenId, price: Amount) -> Result<Option<Token>> {
        let price = amount_to_sql(price)?;

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "UPDATE tokens SET price = ?2 WHERE id = ?1",
                params![id.0 as i64, price],
            )?;
            let token = token_by_id(&tx, id.0 as i64)?;
            tx.commit()?;
            Ok(token)
        })
        .await
    }

    async fn reset_entries(&self) -> Result<u64> {
        self.run(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let reset = tx.execute(
                "UPDATE tokens SET entered = 0, entered_at = NULL WHERE entered = 1",
                [],
            )?;
            tx.commit()?;
            Ok(reset as u64)
        })
        .await
    }

    async fn sum_token_prices(&self) -> Result<Amount> {
        self.run(|conn| {
            let total: i64 =
                conn.query_row("SELECT COALESCE(SUM(price), 0) FROM tokens", [], |row| {
                    row.get(0)
                })?;
            sql_to_amount(total)
        })
        .await
    }

    async fn append_fund_entry(&self, entry: &NewFundEntry, now: i64) -> Result<FundEntry> {
        let entry = entry.clone();
        let amount = amount_to_sql(entry.amount)?;

        self.run(move |conn| {
            conn.execute(
                "INSERT INTO fund_entries (kind, amount, note, origin, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![entry.kind.as_str(), amount, entry.note, entry.origin, now],
            )?;

            Ok(FundEntry {
                id: EntryId(conn.last_insert_rowid() as u64),
                kind: entry.kind,
                amount: entry.amount,
                note: entry.note,
                origin: entry.origin,
                created_at: now,
            })
        })
        .await
    }

    async fn list_fund_entries(&self) -> Result<Vec<FundEntry>> {
        self.run(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{SELECT_FUND_ENTRY} ORDER BY created_at DESC, id DESC"
            ))?;
            let entries = stmt
                .query_map([], row_to_fund_entry)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(entries)
        })
        .await
    }

    async fn fund_totals(&self) -> Result<FundTotals> {
        self.run(|conn| {
            let (credits, debits): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(CASE WHEN kind = 'credit' THEN amount END), 0),
                        COALESCE(SUM(CASE WHEN kind = 'debit' THEN amount END), 0)
                 FROM fund_entries",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(FundTotals {
                credits: sql_to_amount(credits)?,
                debits: sql_to_amount(debits)?,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatepass_core::{CodeSource, OsCodeSource};

    fn assignment(name: &str, price: u64) -> Assignment {
        Assignment {
            holder: Holder {
                name: name.to_string(),
                roll: format!("{}-roll", name),
            },
            price: Amount(price),
        }
    }

    async fn seeded(count: usize) -> (SqliteStore, Vec<TokenCode>) {
        let store = SqliteStore::open_memory().unwrap();
        let codes = OsCodeSource.next_codes(count);
        store.insert_tokens(&codes, false).await.unwrap();
        (store, codes)
    }

    #[tokio::test]
    async fn test_insert_and_get_token() {
        let (store, codes) = seeded(3).await;

        let token = store.get_token_by_code(&codes[1]).await.unwrap().unwrap();
        assert_eq!(token.code, codes[1]);
        assert!(!token.is_assigned());
        assert_eq!(token.price, Amount::ZERO);

        let by_id = store.get_token(token.id).await.unwrap().unwrap();
        assert_eq!(by_id, token);

        let all = store.list_tokens().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_duplicate_codes_reported() {
        let (store, codes) = seeded(2).await;
        let fresh = OsCodeSource.next_code();

        let result = store
            .insert_tokens(&[codes[0], fresh, fresh], false)
            .await
            .unwrap();

        match result {
            BatchInsert::Inserted { tokens, duplicates } => {
                assert_eq!(tokens.len(), 1);
                assert_eq!(tokens[0].code, fresh);
                assert_eq!(duplicates, vec![codes[0], fresh]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.count_tokens().await.unwrap().total, 3);
    }

    #[tokio::test]
    async fn test_require_empty() {
        let (store, _) = seeded(2).await;
        let result = store
            .insert_tokens(&OsCodeSource.next_codes(5), true)
            .await
            .unwrap();
        assert_eq!(result, BatchInsert::StoreNotEmpty { existing: 2 });
        assert_eq!(store.count_tokens().await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_claim_token_guarded() {
        let (store, codes) = seeded(1).await;

        let first = store
            .claim_token(&codes[0], &assignment("asha", 400), 1_000)
            .await
            .unwrap();
        let token = match first {
            ClaimResult::Claimed(token) => token,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(token.holder.as_ref().unwrap().name, "asha");
        assert_eq!(token.assigned_at, Some(1_000));

        let second = store
            .claim_token(&codes[0], &assignment("ravi", 100), 2_000)
            .await
            .unwrap();
        assert_eq!(second, ClaimResult::AlreadyAssigned(token.clone()));

        store.mark_entered(&codes[0], 3_000).await.unwrap();
        let third = store
            .claim_token(&codes[0], &assignment("ravi", 100), 4_000)
            .await
            .unwrap();
        assert!(matches!(third, ClaimResult::AlreadyEntered(t) if t.entered_at == Some(3_000)));

        let missing = store
            .claim_token(&OsCodeSource.next_code(), &assignment("x", 1), 0)
            .await
            .unwrap();
        assert_eq!(missing, ClaimResult::NotFound);
    }

    #[tokio::test]
    async fn test_claim_next_exhausts_pool() {
        let (store, _) = seeded(2).await;

        let a = store.claim_next(&assignment("a", 400), 1).await.unwrap().unwrap();
        let b = store.claim_next(&assignment("b", 400), 2).await.unwrap().unwrap();
        assert_ne!(a.id, b.id);
        assert!(store.claim_next(&assignment("c", 400), 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_entered_branches() {
        let (store, codes) = seeded(2).await;
        store
            .claim_token(&codes[0], &assignment("asha", 400), 10)
            .await
            .unwrap();

        let unpaid = store.mark_entered(&codes[1], 20).await.unwrap();
        assert!(matches!(unpaid, EnterResult::NotAssigned(t) if !t.is_entered()));

        let granted = store.mark_entered(&codes[0], 30).await.unwrap();
        assert!(matches!(granted, EnterResult::Entered(t) if t.entered_at == Some(30)));

        let again = store.mark_entered(&codes[0], 40).await.unwrap();
        assert!(matches!(again, EnterResult::AlreadyEntered(t) if t.entered_at == Some(30)));

        let missing = store.mark_entered(&OsCodeSource.next_code(), 50).await.unwrap();
        assert_eq!(missing, EnterResult::NotFound);
    }

    #[tokio::test]
    async fn test_reset_and_price() {
        let (store, codes) = seeded(3).await;
        for (i, code) in codes.iter().enumerate().take(2) {
            store
                .claim_token(code, &assignment(&format!("h{}", i), 400), 1)
                .await
                .unwrap();
            store.mark_entered(code, 2).await.unwrap();
        }

        assert_eq!(store.reset_entries().await.unwrap(), 2);
        let counts = store.count_tokens().await.unwrap();
        assert_eq!(
            counts,
            TokenCounts {
                total: 3,
                unassigned: 1,
                assigned: 2,
                entered: 0
            }
        );

        let token = store.get_token_by_code(&codes[2]).await.unwrap().unwrap();
        let priced = store.set_price(token.id, Amount(250)).await.unwrap().unwrap();
        assert_eq!(priced.price, Amount(250));
        assert!(!priced.is_assigned());
        assert_eq!(store.sum_token_prices().await.unwrap(), Amount(1_050));

        assert!(store.set_price(TokenId(999), Amount(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fund_entries_newest_first() {
        let store = SqliteStore::open_memory().unwrap();
        let credit = NewFundEntry {
            kind: FundKind::Credit,
            amount: Amount(500),
            note: "sponsor".into(),
            origin: "manual-credit".into(),
        };
        let debit = NewFundEntry {
            kind: FundKind::Debit,
            amount: Amount(200),
            note: "decorations".into(),
            origin: "expense".into(),
        };

        let first = store.append_fund_entry(&credit, 100).await.unwrap();
        let second = store.append_fund_entry(&debit, 100).await.unwrap();
        let third = store.append_fund_entry(&credit, 200).await.unwrap();

        let ids: Vec<_> = store
            .list_fund_entries()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let totals = store.fund_totals().await.unwrap();
        assert_eq!(totals.credits, Amount(1_000));
        assert_eq!(totals.debits, Amount(200));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gatepass.db");
        let code = OsCodeSource.next_code();

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_tokens(&[code], false).await.unwrap();
            store
                .claim_token(&code, &assignment("asha", 400), 7)
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let token = store.get_token_by_code(&code).await.unwrap().unwrap();
        assert_eq!(token.assigned_at, Some(7));
        assert_eq!(token.price, Amount(400));
    }
}
