//! Transaction model
//!
//! A split group is stored as flat rows: one parent and zero or more child
//! legs that point back at it through `parent_id`. A parent without children
//! is an ordinary transaction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, PayeeId, ScheduleId, TransactionId};
use super::money::Money;

/// Computed error attached to a split parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionError {
    /// Child legs do not add up to the parent amount
    SplitTransactionError {
        /// `parent.amount - sum(children.amount)`
        difference: Money,
    },
}

impl TransactionError {
    /// The unallocated amount carried by this error
    pub fn difference(&self) -> Money {
        match self {
            Self::SplitTransactionError { difference } => *difference,
        }
    }
}

/// A single transaction row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Durable or temporary identifier
    pub id: TransactionId,

    pub account: Option<AccountId>,

    pub payee: Option<PayeeId>,

    pub category: Option<CategoryId>,

    /// Amount (positive for inflow, negative for outflow)
    pub amount: Money,

    pub date: NaiveDate,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub cleared: bool,

    /// Matched against a statement; must not be changed casually
    #[serde(default)]
    pub reconciled: bool,

    #[serde(default)]
    pub is_parent: bool,

    #[serde(default)]
    pub is_child: bool,

    /// Parent row of a child leg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TransactionId>,

    /// Recurring schedule this transaction was generated from (read-only here)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TransactionError>,
}

impl Transaction {
    /// Create a plain transaction with a durable id
    pub fn new(account: Option<AccountId>, date: NaiveDate, amount: Money) -> Self {
        Self::with_id(TransactionId::new(), account, date, amount)
    }

    /// Create a plain transaction that has not been persisted yet
    pub fn temporary(account: Option<AccountId>, date: NaiveDate, amount: Money) -> Self {
        Self::with_id(TransactionId::temporary(), account, date, amount)
    }

    fn with_id(
        id: TransactionId,
        account: Option<AccountId>,
        date: NaiveDate,
        amount: Money,
    ) -> Self {
        Self {
            id,
            account,
            payee: None,
            category: None,
            amount,
            date,
            notes: String::new(),
            cleared: false,
            reconciled: false,
            is_parent: false,
            is_child: false,
            parent_id: None,
            schedule: None,
            error: None,
        }
    }

    /// Build a child leg for `parent`
    ///
    /// The leg inherits account, date, payee and cleared state and gets a
    /// temporary id only when the parent itself is temporary.
    pub fn child_of(parent: &Transaction) -> Self {
        let id = if parent.is_temporary() {
            TransactionId::temporary()
        } else {
            TransactionId::new()
        };

        let mut child = Self::with_id(id, parent.account, parent.date, Money::zero());
        child.payee = parent.payee;
        child.cleared = parent.cleared;
        child.reconciled = parent.reconciled;
        child.is_child = true;
        child.parent_id = Some(parent.id.clone());
        child
    }

    /// Whether this row has never been persisted
    pub fn is_temporary(&self) -> bool {
        self.id.is_temporary()
    }

    /// Unallocated split amount, zero when the group balances
    pub fn split_difference(&self) -> Money {
        self.error.map(|e| e.difference()).unwrap_or_default()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date.format("%Y-%m-%d"), self.id, self.amount)
    }
}

/// Editable fields of a transaction row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionField {
    Account,
    Payee,
    Category,
    Amount,
    Date,
    Notes,
    Cleared,
}

impl TransactionField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Payee => "payee",
            Self::Category => "category",
            Self::Amount => "amount",
            Self::Date => "date",
            Self::Notes => "notes",
            Self::Cleared => "cleared",
        }
    }

    /// Parse a field name as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "account" => Some(Self::Account),
            "payee" => Some(Self::Payee),
            "category" => Some(Self::Category),
            "amount" => Some(Self::Amount),
            "date" => Some(Self::Date),
            "notes" | "memo" => Some(Self::Notes),
            "cleared" => Some(Self::Cleared),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A parent transaction with its child legs, as returned by a grouped query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionGroup {
    pub parent: Transaction,
    pub subtransactions: Vec<Transaction>,
}

impl TransactionGroup {
    /// Flatten into `[parent, child1, child2, ...]`
    pub fn ungroup(self) -> Vec<Transaction> {
        let mut rows = Vec::with_capacity(1 + self.subtransactions.len());
        rows.push(self.parent);
        rows.extend(self.subtransactions);
        rows
    }

    /// Regroup flat rows; the first non-child row is the parent
    pub fn group(rows: &[Transaction]) -> Option<Self> {
        let parent = rows.iter().find(|t| !t.is_child)?.clone();
        let subtransactions = rows
            .iter()
            .filter(|t| t.is_child && t.parent_id.as_ref() == Some(&parent.id))
            .cloned()
            .collect();
        Some(Self {
            parent,
            subtransactions,
        })
    }
}
