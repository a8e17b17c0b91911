//! Added/updated/deleted diffs between two sets of rows
//!
//! Rows are matched by id. An updated row is carried whole, not as a field
//! patch.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::models::{Transaction, TransactionId};

/// The batch needed to turn one set of rows into another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changes {
    pub added: Vec<Transaction>,
    pub updated: Vec<Transaction>,
    pub deleted: Vec<Transaction>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of rows in the batch
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.deleted.len()
    }
}

/// Compute the changes from `original` to `current`
///
/// `added` and `updated` follow the order of `current`, `deleted` the order
/// of `original`.
pub fn diff_items(original: &[Transaction], current: &[Transaction]) -> Changes {
    let before: HashMap<&TransactionId, &Transaction> =
        original.iter().map(|t| (&t.id, t)).collect();
    let after: HashSet<&TransactionId> = current.iter().map(|t| &t.id).collect();

    let mut changes = Changes::default();

    for row in current {
        match before.get(&row.id) {
            None => changes.added.push(row.clone()),
            Some(old) if *old != row => changes.updated.push(row.clone()),
            Some(_) => {}
        }
    }

    changes.deleted = original
        .iter()
        .filter(|t| !after.contains(&t.id))
        .cloned()
        .collect();

    changes
}

/// Apply `changes` on top of `original`
///
/// Deleted rows are removed, updated rows replace their originals in place
/// and added rows are appended.
pub fn apply_changes(original: &[Transaction], changes: &Changes) -> Vec<Transaction> {
    let deleted: HashSet<&TransactionId> = changes.deleted.iter().map(|t| &t.id).collect();
    let updated: HashMap<&TransactionId, &Transaction> =
        changes.updated.iter().map(|t| (&t.id, t)).collect();

    original
        .iter()
        .filter(|t| !deleted.contains(&t.id))
        .map(|t| updated.get(&t.id).map_or_else(|| t.clone(), |u| (*u).clone()))
        .chain(changes.added.iter().cloned())
        .collect()
}
