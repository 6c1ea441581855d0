//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.
//!
//! One connection is the writer; every mutation runs on it inside a
//! `BEGIN IMMEDIATE` transaction, which takes SQLite's single write lock for
//! the whole file. Reads run on separate connections in deferred transactions
//! and see a WAL snapshot, so they neither wait for nor delay the writer.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use rusqlite::{
    params, Connection, OpenFlags, OptionalExtension, Transaction, TransactionBehavior,
};
use tracing::{debug, info};

use prchecklist_core::{CheckSet, CheckUpdate, ChecklistRef, User, UserId};

use crate::bucket::Bucket;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::migration;
use crate::record::{decode_checks, decode_user, encode_record};
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Cheap to clone; clones share the same connections.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<Inner>,
}

struct Inner {
    /// The writer connection, protected by a mutex.
    writer: Mutex<Connection>,
    /// Where reads run.
    readers: Readers,
}

enum Readers {
    /// In-memory databases are private to one connection: read on the writer.
    Writer,
    /// File-backed: a pool of read connections.
    Pool {
        config: StoreConfig,
        idle: Mutex<Vec<Connection>>,
    },
}

impl SqliteStore {
    /// Open a SQLite store at the given path with default settings.
    ///
    /// Creates the file and both buckets if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(StoreConfig::new(path.as_ref()))
    }

    /// Open a SQLite store with explicit configuration.
    ///
    /// Fails with `Unavailable` if another writer holds the file lock for
    /// longer than `config.lock_timeout_ms`.
    pub fn open_with_config(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let started_at = Instant::now();

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let mut conn = Connection::open_with_flags(&config.path, flags)
            .map_err(StoreError::unavailable("open"))?;
        apply_pragmas(&conn, &config)?;
        migration::migrate(&mut conn)?;

        info!(
            path = %config.path.display(),
            journal_mode = config.journal_mode.pragma_value(),
            lock_timeout_ms = config.lock_timeout_ms,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "opened checklist store"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(conn),
                readers: Readers::Pool {
                    config,
                    idle: Mutex::new(Vec::new()),
                },
            }),
        })
    }

    /// Open an in-memory SQLite store.
    ///
    /// Useful for testing. Reads and writes share one connection.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory().map_err(StoreError::unavailable("open"))?;
        migration::migrate(&mut conn)?;
        debug!("opened in-memory checklist store");
        Ok(Self {
            inner: Arc::new(Inner {
                writer: Mutex::new(conn),
                readers: Readers::Writer,
            }),
        })
    }

    /// Raw stored bytes under `key`, bypassing decoding.
    pub async fn read_raw(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>> {
        let key = key.to_string();
        self.blocking("read_raw", move |inner| {
            inner.read("read_raw", |tx| {
                get(tx, bucket, &key).map_err(StoreError::unavailable("read_raw"))
            })
        })
        .await
    }

    /// Overwrite the raw bytes under `key`, bypassing encoding.
    ///
    /// For repair and diagnostics; nothing checks that the bytes decode.
    pub async fn write_raw(&self, bucket: Bucket, key: &str, value: Vec<u8>) -> Result<()> {
        let key = key.to_string();
        self.blocking("write_raw", move |inner| {
            inner.write("write_raw", |tx| {
                put(tx, bucket, &key, &value).map_err(StoreError::unavailable("write_raw"))
            })
        })
        .await
    }

    /// All keys in a bucket, in key order.
    pub async fn keys(&self, bucket: Bucket) -> Result<Vec<String>> {
        self.blocking("keys", move |inner| {
            inner.read("keys", |tx| {
                let mut stmt = tx
                    .prepare(&format!("SELECT key FROM {} ORDER BY key", bucket.name()))
                    .map_err(StoreError::unavailable("keys"))?;
                let keys = stmt
                    .query_map([], |row| row.get(0))
                    .and_then(|rows| rows.collect::<rusqlite::Result<Vec<String>>>())
                    .map_err(StoreError::unavailable("keys"))?;
                Ok(keys)
            })
        })
        .await
    }

    /// Run engine work on the blocking pool.
    async fn blocking<F, T>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Inner) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| StoreError::Internal {
                op,
                reason: format!("blocking task failed: {}", e),
            })?
    }

    async fn update_checks(
        &self,
        op: &'static str,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
        mutate: fn(&mut CheckSet, &str, UserId) -> bool,
    ) -> Result<CheckUpdate> {
        reference
            .validate()
            .map_err(StoreError::invalid_reference(op))?;
        user.validate().map_err(StoreError::invalid_user(op))?;
        let key = reference.key();
        let item = item.to_string();

        self.blocking(op, move |inner| {
            let update = inner.write(op, |tx| {
                let stored =
                    get(tx, Bucket::Checks, &key).map_err(StoreError::unavailable(op))?;
                let mut checks = decode_checks(op, &key, stored.as_deref())?;

                if !mutate(&mut checks, &item, user) {
                    return Ok(CheckUpdate::Unchanged);
                }

                let bytes = encode_record(op, Bucket::Checks, &key, &checks)?;
                put(tx, Bucket::Checks, &key, &bytes).map_err(StoreError::unavailable(op))?;
                Ok(CheckUpdate::Changed)
            })?;

            debug!(
                op,
                key = %key,
                item = %item,
                user = %user,
                outcome = ?update,
                "check state updated"
            );
            Ok(update)
        })
        .await
    }
}

impl Inner {
    /// Run `f` in a write transaction on the writer connection.
    ///
    /// Commits if `f` succeeds. On error the transaction is dropped, which
    /// rolls it back.
    fn write<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.writer.lock().map_err(StoreError::poisoned(op))?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::unavailable(op))?;
        let value = f(&tx)?;
        tx.commit().map_err(StoreError::unavailable(op))?;
        Ok(value)
    }

    /// Run `f` in a read transaction: one consistent snapshot for its duration.
    fn read<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        match &self.readers {
            Readers::Writer => {
                let mut conn = self.writer.lock().map_err(StoreError::poisoned(op))?;
                read_in(&mut conn, op, f)
            }
            Readers::Pool { config, idle } => {
                let pooled = idle.lock().ok().and_then(|mut idle| idle.pop());
                let mut conn = match pooled {
                    Some(conn) => conn,
                    None => open_reader(config, op)?,
                };

                let result = read_in(&mut conn, op, f);

                // A connection that failed mid-read is dropped, not reused.
                if result.is_ok() {
                    if let Ok(mut idle) = idle.lock() {
                        if idle.len() < config.max_idle_readers {
                            idle.push(conn);
                        }
                    }
                }
                result
            }
        }
    }
}

fn read_in<T>(
    conn: &mut Connection,
    op: &'static str,
    f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Deferred)
        .map_err(StoreError::unavailable(op))?;
    let value = f(&tx)?;
    tx.commit().map_err(StoreError::unavailable(op))?;
    Ok(value)
}

fn open_reader(config: &StoreConfig, op: &'static str) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(&config.path, flags)
        .map_err(StoreError::unavailable(op))?;
    conn.busy_timeout(config.lock_timeout_duration())
        .map_err(StoreError::unavailable(op))?;
    conn.execute_batch("PRAGMA query_only = ON;")
        .map_err(StoreError::unavailable(op))?;
    Ok(conn)
}

/// Applies the pragmas the store relies on.
///
/// The busy timeout goes first so that the journal mode switch and bootstrap
/// already wait with a bound.
fn apply_pragmas(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.busy_timeout(config.lock_timeout_duration())
        .map_err(StoreError::unavailable("open"))?;
    conn.execute_batch(&format!(
        "PRAGMA journal_mode = {};",
        config.journal_mode.pragma_value()
    ))
    .map_err(StoreError::unavailable("open"))?;
    conn.execute_batch(&format!(
        "PRAGMA synchronous = {};",
        config.sync_mode.pragma_value()
    ))
    .map_err(StoreError::unavailable("open"))?;
    Ok(())
}

fn get(tx: &Transaction<'_>, bucket: Bucket, key: &str) -> rusqlite::Result<Option<Vec<u8>>> {
    tx.prepare_cached(&format!("SELECT value FROM {} WHERE key = ?1", bucket.name()))?
        .query_row(params![key], |row| row.get(0))
        .optional()
}

fn put(tx: &Transaction<'_>, bucket: Bucket, key: &str, value: &[u8]) -> rusqlite::Result<()> {
    tx.prepare_cached(&format!(
        "INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)",
        bucket.name()
    ))?
    .execute(params![key, value])?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        const OP: &str = "upsert_user";

        user.validate().map_err(StoreError::invalid_user(OP))?;
        let key = user.id.to_key();
        let bytes = encode_record(OP, Bucket::Users, &key, user)?;

        self.blocking(OP, move |inner| {
            inner.write(OP, |tx| {
                put(tx, Bucket::Users, &key, &bytes).map_err(StoreError::unavailable(OP))
            })?;
            debug!(op = OP, key = %key, "user upserted");
            Ok(())
        })
        .await
    }

    async fn fetch_users(&self, ids: &[UserId]) -> Result<HashMap<UserId, User>> {
        const OP: &str = "fetch_users";

        let ids = ids.to_vec();
        self.blocking(OP, move |inner| {
            inner.read(OP, |tx| {
                let mut users = HashMap::with_capacity(ids.len());
                for id in ids {
                    if users.contains_key(&id) {
                        continue;
                    }
                    let key = id.to_key();
                    let bytes = get(tx, Bucket::Users, &key)
                        .map_err(StoreError::unavailable(OP))?
                        .ok_or(StoreError::NotFound { op: OP, id })?;
                    users.insert(id, decode_user(OP, &key, &bytes)?);
                }
                Ok(users)
            })
        })
        .await
    }

    async fn fetch_checks(&self, reference: &ChecklistRef) -> Result<CheckSet> {
        const OP: &str = "fetch_checks";

        reference
            .validate()
            .map_err(StoreError::invalid_reference(OP))?;
        let key = reference.key();

        self.blocking(OP, move |inner| {
            inner.read(OP, |tx| {
                let stored =
                    get(tx, Bucket::Checks, &key).map_err(StoreError::unavailable(OP))?;
                decode_checks(OP, &key, stored.as_deref())
            })
        })
        .await
    }

    async fn add_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
    ) -> Result<CheckUpdate> {
        self.update_checks("add_check", reference, item, user, CheckSet::add)
            .await
    }

    async fn remove_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
    ) -> Result<CheckUpdate> {
        self.update_checks("remove_check", reference, item, user, CheckSet::remove)
            .await
    }
}
