//! Store configuration and datasource strings.
//!
//! A datasource names a backend and its location in one string, the form
//! service configs and command lines carry around:
//!
//! - `sqlite:<path>` - SQLite file at `<path>`
//! - `memory:` - in-memory store, nothing persisted

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::StoreError;

/// Default bound on waiting for another writer's lock.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 1_000;

/// Default number of idle read connections kept for reuse.
pub const DEFAULT_MAX_IDLE_READERS: usize = 4;

/// `SQLite` journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JournalMode {
    /// Write-ahead log: readers see a snapshot and never wait on the writer.
    #[default]
    Wal,
    /// Rollback journal. Readers and the writer exclude each other.
    Delete,
}

impl JournalMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` synchronous mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Sync on every commit.
    #[default]
    Full,
    /// Sync at checkpoints only. A crash may lose the last commits, never corrupt.
    Normal,
}

impl SyncMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for [`SqliteStore`](crate::SqliteStore).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the store file. Parent directories are created on open.
    pub path: PathBuf,
    /// How long to wait for another writer before giving up, in milliseconds.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default)]
    pub journal_mode: JournalMode,
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// Idle read connections kept open between calls.
    #[serde(default = "default_max_idle_readers")]
    pub max_idle_readers: usize,
}

const fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

const fn default_max_idle_readers() -> usize {
    DEFAULT_MAX_IDLE_READERS
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            journal_mode: JournalMode::default(),
            sync_mode: SyncMode::default(),
            max_idle_readers: DEFAULT_MAX_IDLE_READERS,
        }
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    pub fn max_idle_readers(mut self, n: usize) -> Self {
        self.max_idle_readers = n;
        self
    }

    pub fn lock_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Reject configurations that can't name a store file.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::Config("store path is empty".into()));
        }
        if self.path.is_dir() {
            return Err(StoreError::Config(format!(
                "store path {} is a directory",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// A parsed datasource string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datasource {
    Sqlite(PathBuf),
    Memory,
}

impl FromStr for Datasource {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scheme, rest) = s
            .split_once(':')
            .ok_or_else(|| StoreError::Config(format!("datasource {:?} has no scheme", s)))?;

        match scheme {
            "sqlite" if rest.is_empty() => Err(StoreError::Config(
                "sqlite datasource needs a path".into(),
            )),
            "sqlite" => Ok(Self::Sqlite(PathBuf::from(rest))),
            "memory" => Ok(Self::Memory),
            other => Err(StoreError::Config(format!(
                "unknown datasource scheme {:?}",
                other
            ))),
        }
    }
}
