//! Display formatting for terminal output

pub mod transaction;

pub use transaction::{
    format_changes, format_transaction_details, format_transaction_register,
    format_transaction_row, format_working_set,
};
