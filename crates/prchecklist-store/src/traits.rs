//! Store trait: the abstract interface for user and check-state persistence.
//!
//! Implementations include SQLite (primary) and in-memory (tests, embedding).

use std::collections::HashMap;

use async_trait::async_trait;
use prchecklist_core::{CheckSet, CheckUpdate, ChecklistRef, User, UserId};

use crate::error::Result;

/// The Store trait: async interface for the two collections.
///
/// All methods are async so callers on a tokio runtime never block on disk.
/// For SQLite, engine work runs on the blocking pool.
///
/// # Design Notes
///
/// - **Validation first**: every checklist operation validates the reference
///   before touching storage and fails with `InvalidReference`.
/// - **Atomic read-modify-write**: `add_check` / `remove_check` read, mutate,
///   and write back inside one write transaction. The engine admits one
///   writer at a time, so concurrent updates to the same checklist serialize
///   and none is lost.
/// - **Idempotent mutations**: adding a present check or removing an absent
///   one returns `Unchanged` and writes nothing.
/// - **Absent is empty**: a checklist never written reads as an empty set.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // User Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert or overwrite a user record, keyed by its id.
    async fn upsert_user(&self, user: &User) -> Result<()>;

    /// Fetch users by id from one consistent snapshot.
    ///
    /// All-or-nothing: fails with `NotFound` on the first id without a record.
    /// Duplicate ids are allowed; the map holds each once.
    async fn fetch_users(&self, ids: &[UserId]) -> Result<HashMap<UserId, User>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Check Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Current check state of a checklist. Empty if never written.
    async fn fetch_checks(&self, reference: &ChecklistRef) -> Result<CheckSet>;

    /// Mark `item` as checked by `user`.
    async fn add_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
    ) -> Result<CheckUpdate>;

    /// Clear `user`'s check on `item`.
    async fn remove_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
    ) -> Result<CheckUpdate>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Set a check to the given state, dispatching to add or remove.
    fn set_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
        checked: bool,
    ) -> impl std::future::Future<Output = Result<CheckUpdate>> + Send;

    /// Fetch a checklist's state together with every user who checked something.
    ///
    /// Two snapshots are involved (checks, then users). Users are never
    /// deleted, so an id seen in the first is always found in the second.
    fn fetch_checks_with_users(
        &self,
        reference: &ChecklistRef,
    ) -> impl std::future::Future<Output = Result<(CheckSet, HashMap<UserId, User>)>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn set_check(
        &self,
        reference: &ChecklistRef,
        item: &str,
        user: UserId,
        checked: bool,
    ) -> Result<CheckUpdate> {
        if checked {
            self.add_check(reference, item, user).await
        } else {
            self.remove_check(reference, item, user).await
        }
    }

    async fn fetch_checks_with_users(
        &self,
        reference: &ChecklistRef,
    ) -> Result<(CheckSet, HashMap<UserId, User>)> {
        let checks = self.fetch_checks(reference).await?;
        let users = self.fetch_users(&checks.user_ids()).await?;
        Ok((checks, users))
    }
}
