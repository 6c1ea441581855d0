//! # prchecklist store
//!
//! Persistence for prchecklist: known users and the per-item check state of
//! pull request checklists. Provides a trait-based interface with SQLite and
//! in-memory implementations.
//!
//! ## Overview
//!
//! The store keeps two buckets in one file:
//!
//! - `users` - decimal user id → encoded [`User`](prchecklist_core::User)
//! - `checks` - canonical checklist key (`owner/repo#number@stage`) →
//!   encoded [`CheckSet`](prchecklist_core::CheckSet)
//!
//! Check mutations are read-modify-write inside a single write transaction.
//! SQLite admits one writer at a time, so concurrent updates to the same
//! checklist serialize and none is lost.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`StoreExt`] - Convenience operations built on [`Store`]
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`StoreError`] - What went wrong, with operation and key attached
//!
//! ## Usage
//!
//! ```rust,no_run
//! use prchecklist_core::{ChecklistRef, User, UserId};
//! use prchecklist_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("prchecklist.db").unwrap();
//!
//!     store.upsert_user(&User::new(1, "motemen", "")).await.unwrap();
//!
//!     let reference = ChecklistRef::new("motemen", "prchecklist", 42);
//!     store.add_check(&reference, "deploy-db", UserId(1)).await.unwrap();
//!
//!     let checks = store.fetch_checks(&reference).await.unwrap();
//!     assert!(checks.is_checked("deploy-db", UserId(1)));
//! }
//! ```

pub mod bucket;
pub mod config;
pub mod error;
pub mod memory;
pub mod migration;
mod record;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

pub use bucket::Bucket;
pub use config::{Datasource, JournalMode, StoreConfig, SyncMode};
pub use error::{ErrorKind, Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Store, StoreExt};

/// Open the store a datasource string names.
///
/// See [`Datasource`] for the accepted forms.
pub fn open_datasource(datasource: &str) -> Result<Arc<dyn Store>> {
    match datasource.parse::<Datasource>()? {
        Datasource::Sqlite(path) => Ok(Arc::new(SqliteStore::open(path)?)),
        Datasource::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
