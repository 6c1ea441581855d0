//! # prchecklist testkit
//!
//! Testing utilities for the prchecklist store.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Generators**: Proptest strategies for references, users, and op sequences
//! - **Model**: A single-threaded reference model that every store must agree with
//! - **Fixtures**: Temporary file-backed stores and seeded users
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use prchecklist_testkit::generators::checklist_ref;
//!
//! proptest! {
//!     #[test]
//!     fn key_parses_back(r in checklist_ref()) {
//!         prop_assert_eq!(r.key().parse::<ChecklistRef>().unwrap(), r);
//!     }
//! }
//! ```
//!
//! ## Model Checking
//!
//! Replay the same ops against a store and the model, then compare:
//!
//! ```rust,ignore
//! use prchecklist_testkit::{random_schedule, CheckModel, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let mut model = CheckModel::new();
//! for op in random_schedule(1, 200, &refs, &items, &users) {
//!     assert_eq!(op.apply(&fixture.store).await?, model.apply(&op));
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod model;

pub use fixtures::{init_tracing, sample_user, seed_users, TestFixture};
pub use model::{random_schedule, CheckModel, CheckOp};
