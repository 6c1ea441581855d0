//! User identities.
//!
//! Identifiers are newtypes so a user id can't be confused with a pull
//! request number at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::error::ValidationError;

/// Externally issued user identifier (the GitHub account id).
///
/// Zero is reserved as "absent" and is never stored.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// Create a new UserId.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The storage key: the decimal string form of the id.
    pub fn to_key(self) -> String {
        self.0.to_string()
    }

    /// Whether this is the reserved zero id.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Reject the reserved zero id.
    pub fn validate(self) -> Result<(), ValidationError> {
        if self.is_zero() {
            return Err(ValidationError::MissingUserId);
        }
        Ok(())
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// A known user, as last reported by the identity provider.
///
/// Re-upserting the same id replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

impl User {
    pub fn new(
        id: impl Into<UserId>,
        login: impl Into<String>,
        avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            login: login.into(),
            avatar_url: avatar_url.into(),
        }
    }

    /// Check that the record can be stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.id.validate()
    }
}
