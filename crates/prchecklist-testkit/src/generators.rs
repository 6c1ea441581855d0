//! Proptest generators for property-based testing.

use proptest::prelude::*;

use prchecklist_core::{ChecklistRef, User, UserId, DEFAULT_STAGE};

use crate::model::CheckOp;

/// Generate a non-zero user id.
pub fn user_id() -> impl Strategy<Value = UserId> {
    (1u64..=u64::MAX).prop_map(UserId)
}

/// Generate a storable user.
pub fn user() -> impl Strategy<Value = User> {
    (user_id(), "[a-zA-Z][a-zA-Z0-9-]{0,38}", "(https://avatars\\.example/u/[0-9]{1,8})?")
        .prop_map(|(id, login, avatar)| User::new(id, login, avatar))
}

/// Generate a GitHub-style owner or repo name.
pub fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9._-]{0,20}".prop_map(String::from)
}

/// Generate a stage name.
pub fn stage() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(DEFAULT_STAGE.to_string()),
        "[a-z][a-z0-9/@#-]{0,12}".prop_map(String::from),
    ]
}

/// Generate a valid checklist reference.
pub fn checklist_ref() -> impl Strategy<Value = ChecklistRef> {
    (segment(), segment(), 1u64..=1_000_000, stage()).prop_map(|(owner, repo, number, stage)| {
        ChecklistRef::with_stage(owner, repo, number, stage)
    })
}

/// Generate a reference that fails validation.
pub fn invalid_checklist_ref() -> impl Strategy<Value = ChecklistRef> {
    checklist_ref().prop_flat_map(|valid| {
        prop_oneof![
            Just(ChecklistRef { owner: String::new(), ..valid.clone() }),
            Just(ChecklistRef { repo: String::new(), ..valid.clone() }),
            Just(ChecklistRef { stage: String::new(), ..valid.clone() }),
            Just(ChecklistRef { number: 0, ..valid.clone() }),
            Just(ChecklistRef { owner: format!("{}/x", valid.owner), ..valid.clone() }),
            Just(ChecklistRef { repo: format!("{}#1", valid.repo), ..valid.clone() }),
            Just(ChecklistRef { stage: format!("{} x", valid.stage), ..valid }),
        ]
    })
}

/// Generate a checklist item key.
pub fn item_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 _-]{0,24}".prop_map(String::from)
}

/// Generate check operations drawn from a small pool of references, items, and
/// users, so the same triples come up again and again.
pub fn check_ops(max_len: usize) -> impl Strategy<Value = Vec<CheckOp>> {
    (
        prop::collection::vec(checklist_ref(), 1..=3),
        prop::collection::vec(item_key(), 1..=3),
        prop::collection::vec(user_id(), 1..=4),
    )
        .prop_flat_map(move |(refs, items, users)| {
            let op = (
                prop::sample::select(refs),
                prop::sample::select(items),
                prop::sample::select(users),
                any::<bool>(),
            )
                .prop_map(|(reference, item, user, add)| CheckOp {
                    reference,
                    item,
                    user,
                    add,
                });
            prop::collection::vec(op, 0..=max_len)
        })
}
