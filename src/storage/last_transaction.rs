//! Last-used transaction defaults
//!
//! Stores the parent of the most recently added transaction in
//! last_transaction.json so new sessions start with its account and date.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{SplitbookError, SplitbookResult};
use crate::models::Transaction;
use crate::session::LastTransactionStore;

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct LastTransactionData {
    #[serde(default)]
    transaction: Option<Transaction>,
}

/// Repository for the last added transaction
pub struct LastTransactionRepository {
    path: PathBuf,
    data: RwLock<Option<Transaction>>,
}

impl LastTransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(None),
        }
    }

    pub fn load(&self) -> SplitbookResult<()> {
        let file_data: LastTransactionData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = file_data.transaction;
        Ok(())
    }
}

impl LastTransactionStore for LastTransactionRepository {
    fn last_transaction(&self) -> SplitbookResult<Option<Transaction>> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.clone())
    }

    /// Remember `transaction` and write it to disk immediately
    fn set_last_transaction(&self, transaction: &Transaction) -> SplitbookResult<()> {
        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        write_json_atomic(
            &self.path,
            &LastTransactionData {
                transaction: Some(transaction.clone()),
            },
        )?;
        *data = Some(transaction.clone());
        Ok(())
    }
}
