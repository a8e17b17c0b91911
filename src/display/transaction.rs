//! Transaction display formatting
//!
//! Register rows for lists, and the working set of an edit session with its
//! legs and the amount still to allocate.

use crate::models::{DateFormat, Transaction};
use crate::session::Changes;

fn status_icon(txn: &Transaction) -> &'static str {
    if txn.reconciled {
        "🔒"
    } else if txn.cleared {
        "✓"
    } else {
        " "
    }
}

fn payee_display(txn: &Transaction) -> String {
    match txn.payee {
        Some(payee) => payee.to_string(),
        None => "(no payee)".to_string(),
    }
}

fn category_display(txn: &Transaction) -> String {
    match (txn.category, txn.is_parent) {
        (_, true) => "(split)".to_string(),
        (Some(category), false) => category.to_string(),
        (None, false) => "(uncategorized)".to_string(),
    }
}

/// Format a single transaction for display (register row)
pub fn format_transaction_row(txn: &Transaction, format: DateFormat) -> String {
    let indent = if txn.is_child { "  ↳ " } else { "" };

    format!(
        "{} {} {}{:20} {:>12}  {}",
        status_icon(txn),
        txn.date.format(format.pattern()),
        indent,
        truncate(&payee_display(txn), 20),
        txn.amount,
        txn.id
    )
}

/// Format a page of top-level transactions as a register
pub fn format_transaction_register(transactions: &[Transaction], format: DateFormat) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:2} {:10} {:20} {:>12}  {}\n",
        "St", "Date", "Payee", "Amount", "ID"
    ));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, format));
        if txn.is_parent {
            output.push_str(" [split]");
        }
        output.push('\n');
    }

    output
}

/// Format the working set of a session: the parent, then each leg
pub fn format_working_set(rows: &[Transaction], format: DateFormat) -> String {
    let Some(parent) = rows.first() else {
        return "Transaction deleted.\n".to_string();
    };

    let mut output = format_transaction_details(parent, format);

    let legs = &rows[1..];
    if !legs.is_empty() {
        output.push_str("\nSplits:\n");
        for (i, leg) in legs.iter().enumerate() {
            let notes = if leg.notes.is_empty() {
                String::new()
            } else {
                format!(" - {}", leg.notes)
            };
            output.push_str(&format!(
                "  {}. {:>12} to {}{}  {}\n",
                i + 1,
                leg.amount,
                category_display(leg),
                notes,
                leg.id
            ));
        }
    }

    if let Some(error) = &parent.error {
        output.push_str(&format!("\nUnallocated: {}\n", error.difference()));
    }

    output
}

/// Format transaction details for display
pub fn format_transaction_details(txn: &Transaction, format: DateFormat) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Date:        {}\n", txn.date.format(format.pattern())));
    output.push_str(&format!("Amount:      {}\n", txn.amount));

    match txn.account {
        Some(account) => output.push_str(&format!("Account:     {}\n", account.as_uuid())),
        None => output.push_str("Account:     (none)\n"),
    }
    output.push_str(&format!("Payee:       {}\n", payee_display(txn)));
    output.push_str(&format!("Category:    {}\n", category_display(txn)));

    if !txn.notes.is_empty() {
        output.push_str(&format!("Notes:       {}\n", txn.notes));
    }

    let status = match (txn.reconciled, txn.cleared) {
        (true, _) => "Reconciled",
        (false, true) => "Cleared",
        (false, false) => "Uncleared",
    };
    output.push_str(&format!("Status:      {}\n", status));

    output
}

/// One-line summary of a committed batch
pub fn format_changes(changes: &Changes) -> String {
    format!(
        "{} added, {} updated, {} deleted",
        changes.added.len(),
        changes.updated.len(),
        changes.deleted.len()
    )
}

/// Pad or truncate to exactly `max_len` characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
