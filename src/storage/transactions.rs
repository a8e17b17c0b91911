//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json. Split legs
//! are stored as ordinary rows; an index keeps each parent's legs in the
//! order they were created.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{Transaction, TransactionGroup, TransactionId};
use crate::session::{BatchPersistence, Changes, TransactionSource};

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: parent id -> child ids in creation order
    by_parent: RwLock<HashMap<TransactionId, Vec<TransactionId>>>,
}

fn index_child(by_parent: &mut HashMap<TransactionId, Vec<TransactionId>>, txn: &Transaction) {
    if let (true, Some(parent_id)) = (txn.is_child, &txn.parent_id) {
        let ids = by_parent.entry(parent_id.clone()).or_default();
        if !ids.contains(&txn.id) {
            ids.push(txn.id.clone());
        }
    }
}

fn unindex(by_parent: &mut HashMap<TransactionId, Vec<TransactionId>>, txn: &Transaction) {
    if let Some(parent_id) = &txn.parent_id {
        if let Some(ids) = by_parent.get_mut(parent_id) {
            ids.retain(|id| id != &txn.id);
            if ids.is_empty() {
                by_parent.remove(parent_id);
            }
        }
    }
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_parent: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build the leg index
    pub fn load(&self) -> SplitbookResult<()> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_parent = self.by_parent.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        by_parent.clear();

        for txn in file_data.transactions {
            index_child(&mut by_parent, &txn);
            data.insert(txn.id.clone(), txn);
        }

        Ok(())
    }

    /// Save transactions to disk
    ///
    /// Top-level rows are written newest first, each followed by its legs.
    pub fn save(&self) -> SplitbookResult<()> {
        let transactions = self.ordered_rows()?;
        write_json_atomic(&self.path, &TransactionData { transactions })
    }

    fn ordered_rows(&self) -> SplitbookResult<Vec<Transaction>> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_parent = self.by_parent.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut top_level: Vec<&Transaction> = data.values().filter(|t| !t.is_child).collect();
        top_level.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

        let mut rows = Vec::with_capacity(data.len());
        for parent in top_level {
            rows.push(parent.clone());
            if let Some(ids) = by_parent.get(&parent.id) {
                rows.extend(ids.iter().filter_map(|id| data.get(id).cloned()));
            }
        }
        Ok(rows)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: &TransactionId) -> SplitbookResult<Option<Transaction>> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(id).cloned())
    }

    /// Plain transactions and split parents, newest first
    pub fn get_top_level(&self) -> SplitbookResult<Vec<Transaction>> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut transactions: Vec<_> = data.values().filter(|t| !t.is_child).cloned().collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(transactions)
    }

    /// Legs of a parent in creation order
    pub fn get_children(&self, parent_id: &TransactionId) -> SplitbookResult<Vec<Transaction>> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_parent = self.by_parent.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(by_parent
            .get(parent_id)
            .map(|ids| ids.iter().filter_map(|id| data.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    /// Insert or update a transaction
    pub fn upsert(&self, txn: Transaction) -> SplitbookResult<()> {
        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_parent = self.by_parent.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if let Some(old) = data.get(&txn.id) {
            if old.parent_id != txn.parent_id {
                unindex(&mut by_parent, old);
            }
        }
        index_child(&mut by_parent, &txn);

        data.insert(txn.id.clone(), txn);
        Ok(())
    }

    /// Delete a transaction
    pub fn delete(&self, id: &TransactionId) -> SplitbookResult<bool> {
        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_parent = self.by_parent.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        match data.remove(id) {
            Some(txn) => {
                unindex(&mut by_parent, &txn);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Count transactions, legs included
    pub fn count(&self) -> SplitbookResult<usize> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.len())
    }

    fn snapshot(
        &self,
    ) -> SplitbookResult<(
        HashMap<TransactionId, Transaction>,
        HashMap<TransactionId, Vec<TransactionId>>,
    )> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        let by_parent = self.by_parent.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok((data.clone(), by_parent.clone()))
    }

    fn restore(
        &self,
        snapshot: (
            HashMap<TransactionId, Transaction>,
            HashMap<TransactionId, Vec<TransactionId>>,
        ),
    ) -> SplitbookResult<()> {
        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        let mut by_parent = self.by_parent.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = snapshot.0;
        *by_parent = snapshot.1;
        Ok(())
    }

    fn apply_batch(&self, changes: &Changes) -> SplitbookResult<Vec<Transaction>> {
        for txn in &changes.deleted {
            self.delete(&txn.id)?;
        }
        for txn in changes.updated.iter().chain(&changes.added) {
            self.upsert(txn.clone())?;
        }
        self.save()?;

        let stored = changes
            .added
            .iter()
            .chain(&changes.updated)
            .map(|t| self.get(&t.id))
            .collect::<SplitbookResult<Vec<_>>>()?;
        Ok(stored.into_iter().flatten().collect())
    }
}

impl TransactionSource for TransactionRepository {
    /// Fetch the group `parent_id` belongs to; a leg id resolves to its parent
    fn fetch_group(&self, parent_id: &TransactionId) -> SplitbookResult<TransactionGroup> {
        let txn = self
            .get(parent_id)?
            .ok_or_else(|| SplitbookError::transaction_not_found(parent_id.as_str()))?;

        let parent = match (&txn.parent_id, txn.is_child) {
            (Some(id), true) => self
                .get(id)?
                .ok_or_else(|| SplitbookError::transaction_not_found(id.as_str()))?,
            _ => txn,
        };

        let subtransactions = self.get_children(&parent.id)?;
        Ok(TransactionGroup {
            parent,
            subtransactions,
        })
    }
}

impl BatchPersistence for TransactionRepository {
    /// Apply deleted, updated, then added rows and write the file once
    ///
    /// If the write fails the in-memory state is rolled back.
    fn batch_update(&self, changes: &Changes) -> SplitbookResult<Vec<Transaction>> {
        let before = self.snapshot()?;

        match self.apply_batch(changes) {
            Ok(stored) => {
                debug!(rows = changes.len(), "Applied transaction batch");
                Ok(stored)
            }
            Err(e) => {
                self.restore(before)?;
                Err(e)
            }
        }
    }
}
