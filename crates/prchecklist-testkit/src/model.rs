//! A single-threaded reference model of check state, and the operations that
//! drive both the model and a real store.
//!
//! The model is deliberately naive: a map from (checklist key, item) to the
//! list of users in check order. Anything a store returns can be compared
//! against it.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use prchecklist_core::{CheckSet, CheckUpdate, ChecklistRef, UserId};
use prchecklist_store::{Result, Store};

/// One add or remove against a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOp {
    pub reference: ChecklistRef,
    pub item: String,
    pub user: UserId,
    /// `true` for add, `false` for remove.
    pub add: bool,
}

impl CheckOp {
    pub fn add(reference: &ChecklistRef, item: &str, user: UserId) -> Self {
        Self {
            reference: reference.clone(),
            item: item.to_string(),
            user,
            add: true,
        }
    }

    pub fn remove(reference: &ChecklistRef, item: &str, user: UserId) -> Self {
        Self {
            add: false,
            ..Self::add(reference, item, user)
        }
    }

    /// The (checklist, item, user) triple this op toggles.
    pub fn triple(&self) -> (String, String, UserId) {
        (self.reference.key(), self.item.clone(), self.user)
    }

    /// Run the op against a store.
    pub async fn apply<S: Store + ?Sized>(&self, store: &S) -> Result<CheckUpdate> {
        if self.add {
            store.add_check(&self.reference, &self.item, self.user).await
        } else {
            store.remove_check(&self.reference, &self.item, self.user).await
        }
    }
}

/// Reference model of every checklist's state.
#[derive(Debug, Default, Clone)]
pub struct CheckModel {
    state: BTreeMap<(String, String), Vec<UserId>>,
}

impl CheckModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an op, returning what a correct store reports for it.
    pub fn apply(&mut self, op: &CheckOp) -> CheckUpdate {
        let key = (op.reference.key(), op.item.clone());
        let users = self.state.entry(key.clone()).or_default();
        let present = users.contains(&op.user);

        let changed = match (op.add, present) {
            (true, false) => {
                users.push(op.user);
                true
            }
            (false, true) => {
                users.retain(|u| *u != op.user);
                true
            }
            _ => false,
        };

        if users.is_empty() {
            self.state.remove(&key);
        }
        CheckUpdate::from(changed)
    }

    pub fn is_checked(&self, reference: &ChecklistRef, item: &str, user: UserId) -> bool {
        self.state
            .get(&(reference.key(), item.to_string()))
            .is_some_and(|users| users.contains(&user))
    }

    /// The state the store should return from `fetch_checks(reference)`.
    pub fn checks(&self, reference: &ChecklistRef) -> CheckSet {
        let key = reference.key();
        let mut checks = CheckSet::new();
        for ((checklist, item), users) in &self.state {
            if *checklist == key {
                for user in users {
                    checks.add(item, *user);
                }
            }
        }
        checks
    }
}

/// A reproducible random schedule of check ops over a small pool of
/// references, items, and users.
pub fn random_schedule(
    seed: u64,
    len: usize,
    refs: &[ChecklistRef],
    items: &[&str],
    users: &[UserId],
) -> Vec<CheckOp> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| CheckOp {
            reference: refs[rng.gen_range(0..refs.len())].clone(),
            item: items[rng.gen_range(0..items.len())].to_string(),
            user: users[rng.gen_range(0..users.len())],
            add: rng.gen_bool(0.5),
        })
        .collect()
}
