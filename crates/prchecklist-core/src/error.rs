//! Error types for prchecklist core.

use thiserror::Error;

/// Structural validation failures for checklist references and users.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing owner")]
    MissingOwner,

    #[error("missing repo")]
    MissingRepo,

    #[error("missing stage")]
    MissingStage,

    #[error("invalid pull request number: {0}")]
    InvalidNumber(String),

    #[error("{field} contains reserved character {ch:?}")]
    ReservedCharacter { field: &'static str, ch: char },

    #[error("malformed checklist key: {0}")]
    MalformedKey(String),

    #[error("user id must be non-zero")]
    MissingUserId,
}

/// Failures while turning records into stored bytes or back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decoding error: {0}")]
    Decode(#[source] serde_json::Error),
}
