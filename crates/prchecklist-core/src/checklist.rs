//! Checklist references: which pull request (and which stage of it) a
//! checklist belongs to.
//!
//! A reference has a canonical string form `owner/repo#number@stage` that is
//! used verbatim as the storage key. The format is injective for valid
//! references: owner and repo never contain the delimiters and the number is
//! plain decimal, so two references share a key iff they are equal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::validation::validate_ref;

/// Stage used when the caller doesn't name one.
pub const DEFAULT_STAGE: &str = "default";

/// Identifies one checklist instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecklistRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub stage: String,
}

impl ChecklistRef {
    /// Reference to the default stage of a pull request.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self::with_stage(owner, repo, number, DEFAULT_STAGE)
    }

    pub fn with_stage(
        owner: impl Into<String>,
        repo: impl Into<String>,
        number: u64,
        stage: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
            stage: stage.into(),
        }
    }

    /// Run the structural checks. See [`validate_ref`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_ref(self)
    }

    /// Canonical storage key.
    ///
    /// Only meaningful for a reference that passes [`validate`](Self::validate).
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ChecklistRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}@{}", self.owner, self.repo, self.number, self.stage)
    }
}

impl FromStr for ChecklistRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedKey(s.to_string());

        let (owner, rest) = s.split_once('/').ok_or_else(malformed)?;
        let (repo, rest) = rest.split_once('#').ok_or_else(malformed)?;
        let (number, stage) = rest.split_once('@').ok_or_else(malformed)?;

        // Plain decimal only, so the key re-renders byte for byte.
        if number.is_empty()
            || !number.bytes().all(|b| b.is_ascii_digit())
            || (number.len() > 1 && number.starts_with('0'))
        {
            return Err(ValidationError::InvalidNumber(number.to_string()));
        }
        let number: u64 = number
            .parse()
            .map_err(|_| ValidationError::InvalidNumber(number.to_string()))?;

        let reference = Self::with_stage(owner, repo, number, stage);
        reference.validate()?;
        Ok(reference)
    }
}
