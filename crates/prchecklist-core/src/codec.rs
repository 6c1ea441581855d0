//! Record encoding for stored values.
//!
//! Values are JSON: self-describing, field names preserved. Decoding ignores
//! fields it doesn't know, so records written by a newer build with extra
//! optional fields still load.
//!
//! Encoding is deterministic for the types in this crate (no hash maps), so
//! the same record always produces the same bytes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

/// Encode a record to stored bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

/// Decode stored bytes into a record.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}
