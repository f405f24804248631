//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, gatepass_core::now_millis()],
            )?;
            tracing::info!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per issued entry pass
        CREATE TABLE tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,  -- never reused
            code TEXT NOT NULL UNIQUE,             -- 16 lowercase hex chars
            holder_name TEXT,
            holder_roll TEXT,
            price INTEGER NOT NULL DEFAULT 0 CHECK (price >= 0),
            assigned INTEGER NOT NULL DEFAULT 0,
            assigned_at INTEGER,                   -- Unix ms
            entered INTEGER NOT NULL DEFAULT 0,
            entered_at INTEGER,                    -- Unix ms
            created_at INTEGER NOT NULL,

            CHECK ((assigned = 1) = (assigned_at IS NOT NULL)),
            CHECK ((assigned = 1) = (holder_name IS NOT NULL AND holder_roll IS NOT NULL)),
            CHECK ((entered = 1) = (entered_at IS NOT NULL)),
            CHECK (entered = 0 OR assigned = 1)
        );

        -- Append-only ledger
        CREATE TABLE fund_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK (kind IN ('credit', 'debit')),
            amount INTEGER NOT NULL CHECK (amount > 0),
            note TEXT NOT NULL,
            origin TEXT NOT NULL,
            created_at INTEGER NOT NULL            -- Unix ms
        );

        CREATE INDEX idx_tokens_assigned ON tokens(assigned, id);
        CREATE INDEX idx_tokens_entered ON tokens(entered);
        CREATE INDEX idx_fund_entries_created ON fund_entries(created_at, id);
        "#,
    )?;

    Ok(())
}
