//! Per-checklist check state.
//!
//! A [`CheckSet`] maps item keys to the users who have checked that item.
//! It serializes as a plain JSON object of arrays:
//!
//! ```json
//! {"deploy-db": [1, 7], "smoke-test": [7]}
//! ```
//!
//! Items keep the order they were decoded in, and new items go last, so a
//! record read and written back keeps its layout.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::types::UserId;

/// Outcome of a check mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckUpdate {
    /// State changed and was written.
    Changed,
    /// Already in the requested state (idempotent, not an error).
    Unchanged,
}

impl CheckUpdate {
    pub fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }
}

impl From<bool> for CheckUpdate {
    fn from(changed: bool) -> Self {
        if changed {
            Self::Changed
        } else {
            Self::Unchanged
        }
    }
}

/// Users who checked one item, in the order they checked it.
///
/// Each id appears at most once. Duplicates in stored data are collapsed on
/// decode, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<UserId>", into = "Vec<UserId>")]
pub struct CheckedBy(Vec<UserId>);

impl CheckedBy {
    pub fn contains(&self, user: UserId) -> bool {
        self.0.contains(&user)
    }

    pub fn iter(&self) -> impl Iterator<Item = UserId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[UserId] {
        &self.0
    }

    fn insert(&mut self, user: UserId) -> bool {
        if self.contains(user) {
            return false;
        }
        self.0.push(user);
        true
    }

    fn remove(&mut self, user: UserId) -> bool {
        match self.0.iter().position(|u| *u == user) {
            Some(pos) => {
                self.0.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl From<Vec<UserId>> for CheckedBy {
    fn from(ids: Vec<UserId>) -> Self {
        let mut checked = Self(Vec::with_capacity(ids.len()));
        for id in ids {
            checked.insert(id);
        }
        checked
    }
}

impl From<CheckedBy> for Vec<UserId> {
    fn from(checked: CheckedBy) -> Self {
        checked.0
    }
}

/// Check state of one checklist.
///
/// An item with nobody left on it is dropped, so "never checked" and
/// "checked then unchecked" look the same. Equality ignores item order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "IndexMap<String, CheckedBy>",
    into = "IndexMap<String, CheckedBy>"
)]
pub struct CheckSet {
    items: IndexMap<String, CheckedBy>,
}

impl CheckSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `user` as having checked `item`. Returns whether anything changed.
    pub fn add(&mut self, item: &str, user: UserId) -> bool {
        self.items.entry(item.to_string()).or_default().insert(user)
    }

    /// Clear `user`'s check on `item`. Returns whether anything changed.
    pub fn remove(&mut self, item: &str, user: UserId) -> bool {
        let Some(checked) = self.items.get_mut(item) else {
            return false;
        };
        let removed = checked.remove(user);
        if checked.is_empty() {
            self.items.shift_remove(item);
        }
        removed
    }

    pub fn is_checked(&self, item: &str, user: UserId) -> bool {
        self.items.get(item).is_some_and(|c| c.contains(user))
    }

    /// Users who checked `item`, empty if nobody did.
    pub fn checked_by(&self, item: &str) -> &[UserId] {
        self.items.get(item).map(CheckedBy::as_slice).unwrap_or(&[])
    }

    /// Every distinct user across all items, sorted.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.items
            .values()
            .flat_map(CheckedBy::iter)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of items with at least one check.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckedBy)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<IndexMap<String, CheckedBy>> for CheckSet {
    fn from(mut items: IndexMap<String, CheckedBy>) -> Self {
        items.retain(|_, checked| !checked.is_empty());
        Self { items }
    }
}

impl From<CheckSet> for IndexMap<String, CheckedBy> {
    fn from(checks: CheckSet) -> Self {
        checks.items
    }
}
