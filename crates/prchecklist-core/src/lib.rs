//! # prchecklist core
//!
//! Pure types for the prchecklist record store: users, checklist references,
//! and per-checklist check state.
//!
//! This crate contains no I/O and no storage. It defines what gets stored
//! and how it is validated and encoded.
//!
//! ## Key Types
//!
//! - [`User`] / [`UserId`] - Known identities, keyed by the provider's numeric id
//! - [`ChecklistRef`] - Which pull request and stage a checklist belongs to
//! - [`CheckSet`] - Item key to the users who checked it
//! - [`CheckUpdate`] - Whether a check mutation changed anything
//!
//! ## Encoding
//!
//! Stored values are JSON. See the [`codec`] module.

pub mod checklist;
pub mod checks;
pub mod codec;
pub mod error;
pub mod types;
pub mod validation;

pub use checklist::{ChecklistRef, DEFAULT_STAGE};
pub use checks::{CheckSet, CheckUpdate, CheckedBy};
pub use codec::{decode, encode};
pub use error::{CodecError, ValidationError};
pub use types::{User, UserId};
pub use validation::validate_ref;
