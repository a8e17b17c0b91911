//! Core data models for splitbook
//!
//! This module contains the data structures shared by the session, storage
//! and CLI layers: identifiers, money, the transaction record with its split
//! group, and the editable form of a transaction.

pub mod editable;
pub mod ids;
pub mod money;
pub mod transaction;

pub use editable::{DateFormat, EditableTransaction};
pub use ids::{AccountId, CategoryId, PayeeId, ScheduleId, TransactionId, TEMP_ID_PREFIX};
pub use money::{parse_decimal, Money, MoneyParseError};
pub use transaction::{Transaction, TransactionError, TransactionField, TransactionGroup};
