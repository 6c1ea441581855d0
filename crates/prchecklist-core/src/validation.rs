//! Checklist reference validation.

use crate::checklist::ChecklistRef;
use crate::error::ValidationError;

/// Characters that delimit the canonical key and so can't appear in owner or repo.
const KEY_DELIMITERS: [char; 3] = ['/', '#', '@'];

/// Validate a reference before it is turned into a storage key.
///
/// This performs:
/// - Required fields present (owner, repo, stage)
/// - Pull request number is positive
/// - Owner and repo free of key delimiters and whitespace
/// - Stage free of whitespace
pub fn validate_ref(reference: &ChecklistRef) -> Result<(), ValidationError> {
    // 1. Required fields
    if reference.owner.is_empty() {
        return Err(ValidationError::MissingOwner);
    }
    if reference.repo.is_empty() {
        return Err(ValidationError::MissingRepo);
    }
    if reference.stage.is_empty() {
        return Err(ValidationError::MissingStage);
    }

    // 2. Number
    if reference.number == 0 {
        return Err(ValidationError::InvalidNumber(reference.number.to_string()));
    }

    // 3. Owner and repo must keep the key unambiguous
    check_segment("owner", &reference.owner, &KEY_DELIMITERS)?;
    check_segment("repo", &reference.repo, &KEY_DELIMITERS)?;

    // 4. Stage is the key's tail; only whitespace is refused
    check_segment("stage", &reference.stage, &[])?;

    Ok(())
}

fn check_segment(
    field: &'static str,
    value: &str,
    reserved: &[char],
) -> Result<(), ValidationError> {
    match value
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || reserved.contains(c))
    {
        Some(ch) => Err(ValidationError::ReservedCharacter { field, ch }),
        None => Ok(()),
    }
}
