//! Audit entry data structures
//!
//! One entry per transaction row touched by a committed batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Transaction;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Row was created
    Create,
    /// Row was updated
    Update,
    /// Row was deleted
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Whether the audited row was a plain transaction, a split parent or a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Plain,
    Parent,
    Leg,
}

impl RowKind {
    pub fn of(transaction: &Transaction) -> Self {
        if transaction.is_child {
            RowKind::Leg
        } else if transaction.is_parent {
            RowKind::Parent
        } else {
            RowKind::Plain
        }
    }
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowKind::Plain => write!(f, "Transaction"),
            RowKind::Parent => write!(f, "SplitParent"),
            RowKind::Leg => write!(f, "SplitLeg"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub kind: RowKind,

    /// ID of the affected row
    pub transaction_id: String,

    /// Short description, e.g. "2025-03-01 -$12.00"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,

    /// Human-readable diff summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

fn describe(transaction: &Transaction) -> String {
    format!("{} {}", transaction.date, transaction.amount)
}

impl AuditEntry {
    /// Create a new audit entry for a create operation
    pub fn create(transaction: &Transaction) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Create,
            kind: RowKind::of(transaction),
            transaction_id: transaction.id.to_string(),
            summary: Some(describe(transaction)),
            before: None,
            after: serde_json::to_value(transaction).ok(),
            diff_summary: None,
        }
    }

    /// Create a new audit entry for an update operation
    pub fn update(before: &Transaction, after: &Transaction, diff_summary: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Update,
            kind: RowKind::of(after),
            transaction_id: after.id.to_string(),
            summary: Some(describe(after)),
            before: serde_json::to_value(before).ok(),
            after: serde_json::to_value(after).ok(),
            diff_summary,
        }
    }

    /// Create a new audit entry for a delete operation
    pub fn delete(transaction: &Transaction) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: Operation::Delete,
            kind: RowKind::of(transaction),
            transaction_id: transaction.id.to_string(),
            summary: Some(describe(transaction)),
            before: serde_json::to_value(transaction).ok(),
            after: None,
            diff_summary: None,
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.kind,
            self.transaction_id
        );

        if let Some(summary) = &self.summary {
            output.push_str(&format!(" ({})", summary));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}
