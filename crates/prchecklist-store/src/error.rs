//! Error types for the store module.

use prchecklist_core::{CodecError, UserId, ValidationError};
use thiserror::Error;

use crate::bucket::Bucket;

/// Errors that can occur during store operations.
///
/// Every operation-level variant names the operation that failed and, where
/// there is one, the key it was working on.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The checklist reference failed validation; storage was not touched.
    #[error("{op}: invalid checklist reference: {source}")]
    InvalidReference {
        op: &'static str,
        #[source]
        source: ValidationError,
    },

    /// The user record can't be stored (zero id).
    #[error("{op}: invalid user: {source}")]
    InvalidUser {
        op: &'static str,
        #[source]
        source: ValidationError,
    },

    /// A requested user has no stored record.
    #[error("{op}: not found: user id={id}")]
    NotFound { op: &'static str, id: UserId },

    /// Stored bytes don't decode into the expected record.
    #[error("{op}: corrupt record {bucket}/{key}: {source}")]
    Corruption {
        op: &'static str,
        bucket: Bucket,
        key: String,
        #[source]
        source: CodecError,
    },

    /// A record couldn't be encoded for writing.
    #[error("{op}: cannot encode {bucket}/{key}: {source}")]
    Encoding {
        op: &'static str,
        bucket: Bucket,
        key: String,
        #[source]
        source: CodecError,
    },

    /// The engine couldn't open, lock, read, or commit.
    #[error("{op}: store unavailable: {source}")]
    Unavailable {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// An in-process lock was poisoned or a blocking task died. The store
    /// handle should be dropped.
    #[error("{op}: store unavailable: {reason}")]
    Internal { op: &'static str, reason: String },

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Bad configuration or datasource string.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`StoreError`], for callers that only need to
/// decide how to respond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidReference,
    InvalidUser,
    NotFound,
    Corruption,
    Unavailable,
    Other,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidReference { .. } => ErrorKind::InvalidReference,
            Self::InvalidUser { .. } => ErrorKind::InvalidUser,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Corruption { .. } => ErrorKind::Corruption,
            Self::Unavailable { .. } | Self::Internal { .. } | Self::Io(_) => {
                ErrorKind::Unavailable
            }
            Self::Encoding { .. } | Self::Migration(_) | Self::Config(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn unavailable(op: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Unavailable { op, source }
    }

    pub(crate) fn invalid_reference(op: &'static str) -> impl FnOnce(ValidationError) -> Self {
        move |source| Self::InvalidReference { op, source }
    }

    pub(crate) fn invalid_user(op: &'static str) -> impl FnOnce(ValidationError) -> Self {
        move |source| Self::InvalidUser { op, source }
    }

    pub(crate) fn poisoned<E: std::fmt::Display>(op: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Internal {
            op,
            reason: format!("lock poisoned: {}", e),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
