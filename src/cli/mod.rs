//! CLI command handlers
//!
//! Bridges clap argument parsing with the split session and storage.

pub mod rule;
pub mod transaction;

pub use rule::{handle_rule_command, RuleCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};
