//! Payee rules for auto-fill
//!
//! A payee rule suggests a category and notes whenever a transaction uses
//! that payee. Rules live in rules.json.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{CategoryId, PayeeId, Transaction};
use crate::session::RuleEngine;

use super::file_io::{read_json, write_json_atomic};

/// Suggested values for transactions with a given payee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayeeRule {
    pub payee: PayeeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PayeeRule {
    fn apply(&self, transaction: &mut Transaction) {
        if let Some(category) = self.category {
            transaction.category = Some(category);
        }
        if let Some(notes) = &self.notes {
            transaction.notes = notes.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RuleData {
    rules: Vec<PayeeRule>,
}

/// Repository for payee rules
pub struct RuleRepository {
    path: PathBuf,
    data: RwLock<Vec<PayeeRule>>,
}

impl RuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> SplitbookResult<()> {
        let file_data: RuleData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = file_data.rules;
        Ok(())
    }

    pub fn save(&self) -> SplitbookResult<()> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        write_json_atomic(&self.path, &RuleData { rules: data.clone() })
    }

    pub fn get_all(&self) -> SplitbookResult<Vec<PayeeRule>> {
        let data = self.data.read().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.clone())
    }

    /// Add a rule, replacing any existing rule for the same payee
    pub fn upsert(&self, rule: PayeeRule) -> SplitbookResult<()> {
        let mut data = self.data.write().map_err(|e| {
            SplitbookError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        match data.iter_mut().find(|r| r.payee == rule.payee) {
            Some(existing) => *existing = rule,
            None => data.push(rule),
        }
        Ok(())
    }
}

impl RuleEngine for RuleRepository {
    fn run(&self, transaction: &Transaction) -> Transaction {
        let mut suggested = transaction.clone();

        let Some(payee) = transaction.payee else {
            return suggested;
        };

        match self.data.read() {
            Ok(rules) => {
                if let Some(rule) = rules.iter().find(|r| r.payee == payee) {
                    rule.apply(&mut suggested);
                }
            }
            Err(e) => warn!(error = %e, "Rules unavailable, skipping auto-fill"),
        }
        suggested
    }
}
