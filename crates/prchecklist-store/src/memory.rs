//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence. Values are kept as
//! encoded bytes, so decode failures and the codec behave exactly as they do
//! on disk.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use prchecklist_core::{CheckSet, CheckUpdate, ChecklistRef, User, UserId};

use crate::bucket::Bucket;
use crate::error::{Result, StoreError};
use crate::record::{decode_checks, decode_user, encode_record};
use crate::traits::Store;

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock: the
/// write lock plays the role of the engine's single writer, read locks are
/// snapshots.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: BTreeMap<String, Vec<u8>>,
    checks: BTreeMap<String, Vec<u8>>,
}

impl MemoryStoreInner {
    fn bucket(&self, bucket: Bucket) -> &BTreeMap<String, Vec<u8>> {
        match bucket {
            Bucket::Users => &self.users,
            Bucket::Checks => &self.checks,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BTreeMap<String, Vec<u8>> {
        match bucket {
            Bucket::Users => &mut self.users,
            Bucket::Checks => &mut self.checks,
        }
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    /// Raw stored bytes under `key`.
    pub fn read_raw(&self, bucket: Bucket, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.read("read_raw")?.bucket(bucket).get(key).cloned())
    }

    /// Overwrite the raw bytes under `key`, bypassing encoding.
    pub fn write_raw(&self, bucket: Bucket, key: &str, value: Vec<u8>) -> Result<()> {
        self.write("write_raw")?
            .bucket_mut(bucket)
            .insert(key.to_string(), value);
        Ok(())
    }

    /// All keys in a bucket, in key order.
    pub fn keys(&self, bucket: Bucket) -> Result<Vec<String>> {
        Ok(self.read("keys")?.bucket(bucket).keys().cloned().collect())
    }

    fn read(&self, op: &'static str) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(StoreError::poisoned(op))
    }

    fn write(&self, op: &'static str) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(StoreError::poisoned(op))
    }

    fn update_checks(
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

        let mut inner = self.write(op)?;
        let mut checks = decode_checks(op, &key, inner.checks.get(&key).map(Vec::as_slice))?;
        let update = if mutate(&mut checks, item, user) {
            // Encode before touching the map so a failure leaves it as it was.
            let bytes = encode_record(op, Bucket::Checks, &key, &checks)?;
            inner.checks.insert(key.clone(), bytes);
            CheckUpdate::Changed
        } else {
            CheckUpdate::Unchanged
        };
        drop(inner);

        debug!(op, key = %key, item, user = %user, outcome = ?update, "check state updated");
        Ok(update)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        const OP: &str = "upsert_user";

        user.validate().map_err(StoreError::invalid_user(OP))?;
        let key = user.id.to_key();
        let bytes = encode_record(OP, Bucket::Users, &key, user)?;
        self.write(OP)?.users.insert(key.clone(), bytes);
        debug!(op = OP, key = %key, "user upserted");
        Ok(())
    }

    async fn fetch_users(&self, ids: &[UserId]) -> Result<HashMap<UserId, User>> {
        const OP: &str = "fetch_users";

        let inner = self.read(OP)?;
        let mut users = HashMap::with_capacity(ids.len());
        for &id in ids {
            let key = id.to_key();
            let bytes = inner
                .users
                .get(&key)
                .ok_or(StoreError::NotFound { op: OP, id })?;
            users.insert(id, decode_user(OP, &key, bytes)?);
        }
        Ok(users)
    }

    async fn fetch_checks(&self, reference: &ChecklistRef) -> Result<CheckSet> {
        const OP: &str = "fetch_checks";

        reference
            .validate()
            .map_err(StoreError::invalid_reference(OP))?;
        let key = reference.key();
        let inner = self.read(OP)?;
        decode_checks(OP, &key, inner.checks.get(&key).map(Vec::as_slice))
    }

    async fn add_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
    ) -> Result<CheckUpdate> {
        self.update_checks("add_check", reference, item, user, CheckSet::add)
    }

    async fn remove_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
    ) -> Result<CheckUpdate> {
        self.update_checks("remove_check", reference, item, user, CheckSet::remove)
    }
}
