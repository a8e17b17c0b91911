//! The human-facing form of a transaction used while it is being edited
//!
//! Amounts are decimals in major units and dates are strings in the user's
//! preferred format. Everything else passes through unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, PayeeId, ScheduleId, TransactionId};
use super::transaction::TransactionError;

/// Supported date formats for editable dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/dd/yyyy")]
    MonthDayYear,
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYear,
    #[serde(rename = "yyyy-MM-dd")]
    Iso,
    #[serde(rename = "MM.dd.yyyy")]
    MonthDayYearDotted,
    #[serde(rename = "dd.MM.yyyy")]
    DayMonthYearDotted,
}

impl DateFormat {
    pub const ALL: [DateFormat; 5] = [
        Self::MonthDayYear,
        Self::DayMonthYear,
        Self::Iso,
        Self::MonthDayYearDotted,
        Self::DayMonthYearDotted,
    ];

    /// The user-facing name, e.g. `MM/dd/yyyy`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthDayYear => "MM/dd/yyyy",
            Self::DayMonthYear => "dd/MM/yyyy",
            Self::Iso => "yyyy-MM-dd",
            Self::MonthDayYearDotted => "MM.dd.yyyy",
            Self::DayMonthYearDotted => "dd.MM.yyyy",
        }
    }

    /// chrono pattern for the full date
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::MonthDayYear => "%m/%d/%Y",
            Self::DayMonthYear => "%d/%m/%Y",
            Self::Iso => "%Y-%m-%d",
            Self::MonthDayYearDotted => "%m.%d.%Y",
            Self::DayMonthYearDotted => "%d.%m.%Y",
        }
    }

    pub fn separator(&self) -> char {
        match self {
            Self::MonthDayYear | Self::DayMonthYear => '/',
            Self::Iso => '-',
            Self::MonthDayYearDotted | Self::DayMonthYearDotted => '.',
        }
    }

    /// Whether the short day/month form puts the day first
    pub fn day_first(&self) -> bool {
        matches!(self, Self::DayMonthYear | Self::DayMonthYearDotted)
    }

    /// Parse a format name as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s.trim())
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction in its editable form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableTransaction {
    pub id: TransactionId,
    pub account: Option<AccountId>,
    pub payee: Option<PayeeId>,
    pub category: Option<CategoryId>,
    /// Major units, e.g. `-100.00`
    pub amount: Decimal,
    /// Formatted with the session's `DateFormat`
    pub date: String,
    pub notes: String,
    pub cleared: bool,
    pub reconciled: bool,
    pub is_parent: bool,
    pub is_child: bool,
    pub parent_id: Option<TransactionId>,
    pub schedule: Option<ScheduleId>,
    pub error: Option<TransactionError>,
}
