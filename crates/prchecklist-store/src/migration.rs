//! Store bootstrap and schema migrations for SQLite.
//!
//! Each bucket is a `WITHOUT ROWID` table clustered on its key, which gives
//! the ordered key/value layout the store expects. Schema changes go through
//! a simple versioned migration table.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::bucket::Bucket;
use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

const OP: &str = "bootstrap";

/// Create any missing buckets and apply pending migrations.
///
/// Runs inside a single write transaction, so it waits for (at most the busy
/// timeout) and then excludes any other writer on the same file. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(StoreError::unavailable(OP))?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(StoreError::unavailable(OP))?;

    let current: u32 = tx
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(StoreError::unavailable(OP))?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "store schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    for version in (current + 1)..=CURRENT_VERSION {
        apply_migration(&tx, version)?;

        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![version, now_millis()],
        )
        .map_err(StoreError::unavailable(OP))?;
    }

    // A bucket dropped by hand comes back empty rather than failing every call.
    ensure_buckets(&tx)?;

    tx.commit().map_err(StoreError::unavailable(OP))
}

/// Apply a specific migration version.
fn apply_migration(tx: &Transaction<'_>, version: u32) -> Result<()> {
    match version {
        1 => ensure_buckets(tx),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

fn ensure_buckets(tx: &Transaction<'_>) -> Result<()> {
    for bucket in Bucket::ALL {
        tx.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            ) WITHOUT ROWID;",
            bucket.name()
        ))
        .map_err(StoreError::unavailable(OP))?;
    }
    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
