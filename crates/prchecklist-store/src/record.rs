//! Byte-level record handling shared by every store implementation.
//!
//! Stores keep opaque bytes per (bucket, key); these helpers turn them into
//! domain records and back, attaching operation and key context to failures.

use prchecklist_core::{codec, CheckSet, User};
use serde::Serialize;
use tracing::warn;

use crate::bucket::Bucket;
use crate::error::{Result, StoreError};

pub(crate) fn encode_record<T: Serialize>(
    op: &'static str,
    bucket: Bucket,
    key: &str,
    value: &T,
) -> Result<Vec<u8>> {
    codec::encode(value).map_err(|source| StoreError::Encoding {
        op,
        bucket,
        key: key.to_string(),
        source,
    })
}

pub(crate) fn decode_user(op: &'static str, key: &str, bytes: &[u8]) -> Result<User> {
    codec::decode(bytes).map_err(|source| corruption(op, Bucket::Users, key, source))
}

/// Absent bytes decode to an empty set.
pub(crate) fn decode_checks(
    op: &'static str,
    key: &str,
    bytes: Option<&[u8]>,
) -> Result<CheckSet> {
    match bytes {
        None => Ok(CheckSet::new()),
        Some(bytes) => {
            codec::decode(bytes).map_err(|source| corruption(op, Bucket::Checks, key, source))
        }
    }
}

fn corruption(
    op: &'static str,
    bucket: Bucket,
    key: &str,
    source: prchecklist_core::CodecError,
) -> StoreError {
    warn!(op, %bucket, key, error = %source, "stored record failed to decode");
    StoreError::Corruption {
        op,
        bucket,
        key: key.to_string(),
        source,
    }
}
