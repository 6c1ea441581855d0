//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use prchecklist_core::{ChecklistRef, User, UserId};
use prchecklist_store::{Result, SqliteStore, Store, StoreConfig};

/// Lock timeout for fixture stores. Long enough that heavily contended
/// writers queue instead of failing.
pub const FIXTURE_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// A file-backed store in a temporary directory.
///
/// The directory is removed when the fixture drops.
pub struct TestFixture {
    pub store: SqliteStore,
    path: PathBuf,
    _dir: TempDir,
}

impl TestFixture {
    /// Create a fresh store file.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("prchecklist.db");
        let store =
            SqliteStore::open_with_config(Self::config(&path)).expect("open fixture store");
        Self {
            store,
            path,
            _dir: dir,
        }
    }

    fn config(path: &Path) -> StoreConfig {
        StoreConfig::new(path).lock_timeout(FIXTURE_LOCK_TIMEOUT)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a second, independent handle on the same file, the way another
    /// process would see it.
    pub fn reopen(&self) -> SqliteStore {
        SqliteStore::open_with_config(Self::config(&self.path)).expect("reopen fixture store")
    }

    /// A checklist on the fixture repository.
    pub fn reference(&self, number: u64) -> ChecklistRef {
        ChecklistRef::new("motemen", "test-repository", number)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A user with a login and avatar derived from the id.
pub fn sample_user(id: u64) -> User {
    User::new(
        id,
        format!("user{}", id),
        format!("https://avatars.example/u/{}", id),
    )
}

/// Store `sample_user(id)` for every id.
pub async fn seed_users<S: Store + ?Sized>(store: &S, ids: &[u64]) -> Result<Vec<UserId>> {
    let mut seeded = Vec::with_capacity(ids.len());
    for &id in ids {
        let user = sample_user(id);
        store.upsert_user(&user).await?;
        seeded.push(user.id);
    }
    Ok(seeded)
}

/// Route `tracing` output to the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
