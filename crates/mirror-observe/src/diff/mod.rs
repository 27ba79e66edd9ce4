//! List diff computation
//!
//! Observers describe each state transition as four disjoint change sets:
//! inserted, removed, updated, and moved. An entry belongs to exactly one
//! set per transition, and a value change wins over a position change.

use std::collections::HashMap;
use std::hash::Hash;

/// One entry of a change set: the item plus its position
///
/// Removed entries carry the position in the previous state; all other sets
/// carry the position in the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry<T> {
    pub item: T,
    pub index: usize,
}

impl<T> ListEntry<T> {
    pub fn new(item: T, index: usize) -> Self {
        Self { item, index }
    }
}

/// The change sets of one list state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDiff<T> {
    pub inserted: Vec<ListEntry<T>>,
    pub removed: Vec<ListEntry<T>>,
    pub updated: Vec<ListEntry<T>>,
    pub moved: Vec<ListEntry<T>>,
}

// Manual impl; derive would demand T: Default
impl<T> Default for ListDiff<T> {
    fn default() -> Self {
        Self {
            inserted: Vec::new(),
            removed: Vec::new(),
            updated: Vec::new(),
            moved: Vec::new(),
        }
    }
}

impl<T> ListDiff<T> {
    /// Check whether the transition changed anything at all
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && self.moved.is_empty()
    }
}

/// Diff two keyed orderings of a list
///
/// Classification per key:
/// - only in `old`: removed, at its old position
/// - only in `new`: inserted, at its new position
/// - in both with a changed value: updated, at its new position
/// - in both, value unchanged, but its rank among surviving keys changed:
///   moved, at its new position
///
/// The survivor-rank rule keeps entries that merely shifted because a
/// neighbor was inserted or removed out of the moved set.
pub fn compute_list_diff<K, T, F>(old: &[(K, T)], new: &[(K, T)], is_equal: F) -> ListDiff<T>
where
    K: Eq + Hash + Clone,
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let old_positions: HashMap<&K, usize> =
        old.iter().enumerate().map(|(i, (k, _))| (k, i)).collect();
    let new_positions: HashMap<&K, usize> =
        new.iter().enumerate().map(|(i, (k, _))| (k, i)).collect();

    // Rank of each surviving key within its own sequence
    let old_ranks: HashMap<&K, usize> = old
        .iter()
        .map(|(k, _)| k)
        .filter(|k| new_positions.contains_key(k))
        .enumerate()
        .map(|(rank, k)| (k, rank))
        .collect();
    let new_ranks: HashMap<&K, usize> = new
        .iter()
        .map(|(k, _)| k)
        .filter(|k| old_positions.contains_key(k))
        .enumerate()
        .map(|(rank, k)| (k, rank))
        .collect();

    let mut diff = ListDiff::default();

    for (index, (key, item)) in old.iter().enumerate() {
        if !new_positions.contains_key(key) {
            diff.removed.push(ListEntry::new(item.clone(), index));
        }
    }

    for (index, (key, item)) in new.iter().enumerate() {
        let Some(&old_index) = old_positions.get(key) else {
            diff.inserted.push(ListEntry::new(item.clone(), index));
            continue;
        };

        if !is_equal(&old[old_index].1, item) {
            diff.updated.push(ListEntry::new(item.clone(), index));
        } else if old_ranks.get(key) != new_ranks.get(key) {
            diff.moved.push(ListEntry::new(item.clone(), index));
        }
    }

    diff
}
