//! Storage layer for splitbook
//!
//! JSON file storage with atomic writes. `Storage` owns every repository and
//! is the production implementation of the session boundaries.

pub mod file_io;
pub mod last_transaction;
pub mod pager;
pub mod rules;
pub mod transactions;

pub use file_io::{read_json, write_json_atomic};
pub use last_transaction::LastTransactionRepository;
pub use pager::TransactionPager;
pub use rules::{PayeeRule, RuleRepository};
pub use transactions::TransactionRepository;

use std::collections::HashMap;

use tracing::warn;

use crate::audit::{entries_for, AuditLogger};
use crate::config::paths::SplitbookPaths;
use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{Transaction, TransactionGroup, TransactionId};
use crate::session::{
    BatchPersistence, Changes, LastTransactionStore, RuleEngine, TransactionSource,
};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: SplitbookPaths,
    pub transactions: TransactionRepository,
    pub last_transaction: LastTransactionRepository,
    pub rules: RuleRepository,
    audit: AuditLogger,
    audit_enabled: bool,
}

impl Storage {
    /// Create a new Storage instance with audit logging on
    pub fn new(paths: SplitbookPaths) -> Result<Self, SplitbookError> {
        paths.ensure_directories()?;

        Ok(Self {
            transactions: TransactionRepository::new(paths.transactions_file()),
            last_transaction: LastTransactionRepository::new(paths.last_transaction_file()),
            rules: RuleRepository::new(paths.rules_file()),
            audit: AuditLogger::new(paths.audit_log()),
            audit_enabled: true,
            paths,
        })
    }

    pub fn with_audit(mut self, enabled: bool) -> Self {
        self.audit_enabled = enabled;
        self
    }

    pub fn paths(&self) -> &SplitbookPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), SplitbookError> {
        self.transactions.load()?;
        self.last_transaction.load()?;
        self.rules.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), SplitbookError> {
        self.transactions.save()?;
        self.rules.save()?;
        Ok(())
    }

    /// A pager over top-level transactions
    pub fn pager(&self, page_size: usize) -> TransactionPager<'_> {
        TransactionPager::new(&self.transactions, page_size)
    }
}

impl TransactionSource for Storage {
    fn fetch_group(&self, parent_id: &TransactionId) -> SplitbookResult<TransactionGroup> {
        self.transactions.fetch_group(parent_id)
    }
}

impl BatchPersistence for Storage {
    /// Apply the batch, then record it in the audit log
    ///
    /// An audit write failure is logged and does not undo the batch.
    fn batch_update(&self, changes: &Changes) -> SplitbookResult<Vec<Transaction>> {
        let previous = if self.audit_enabled {
            changes
                .updated
                .iter()
                .map(|t| self.transactions.get(&t.id))
                .collect::<SplitbookResult<Vec<_>>>()?
                .into_iter()
                .flatten()
                .map(|t| (t.id.clone(), t))
                .collect()
        } else {
            HashMap::new()
        };

        let stored = self.transactions.batch_update(changes)?;

        if self.audit_enabled {
            if let Err(e) = self.audit.log_batch(&entries_for(changes, &previous)) {
                warn!(error = %e, "Failed to write audit entries");
            }
        }
        Ok(stored)
    }
}

impl RuleEngine for Storage {
    fn run(&self, transaction: &Transaction) -> Transaction {
        self.rules.run(transaction)
    }
}

impl LastTransactionStore for Storage {
    fn last_transaction(&self) -> SplitbookResult<Option<Transaction>> {
        self.last_transaction.last_transaction()
    }

    fn set_last_transaction(&self, transaction: &Transaction) -> SplitbookResult<()> {
        self.last_transaction.set_last_transaction(transaction)
    }
}
