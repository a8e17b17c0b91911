//! Transaction CLI commands
//!
//! Each command that changes data opens one split session, applies the
//! requested edits through it and commits once.

use chrono::Local;
use clap::Subcommand;
use rust_decimal::Decimal;

use crate::config::Settings;
use crate::display::transaction::{
    format_changes, format_transaction_register, format_working_set,
};
use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{parse_decimal, CategoryId, DateFormat, TransactionField, TransactionId};
use crate::session::{
    AddSplitOutcome, CommitOutcome, FieldEdit, FixedAnswer, Guarded, LastTransactionStore,
    SessionOptions, SplitSession, TransactionSource,
};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add a new transaction, optionally split into legs
    Add {
        /// Amount (e.g., "-50.00" for outflow, "100.00" for inflow)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Account ID, defaults to the last used account
        #[arg(short, long)]
        account: Option<String>,
        /// Payee ID; payee rules fill in the rest
        #[arg(short, long)]
        payee: Option<String>,
        /// Category ID
        #[arg(short, long)]
        category: Option<String>,
        /// Date in the configured format, defaults to the last used date
        #[arg(short, long)]
        date: Option<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Mark as cleared
        #[arg(long)]
        cleared: bool,
        /// Split leg, repeatable
        #[arg(long = "leg", value_name = "AMOUNT[:CATEGORY]", allow_hyphen_values = true)]
        legs: Vec<String>,
    },
    /// List transactions, newest first
    List {
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Rows per page, defaults to the configured page size
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Show a transaction and its split legs
    Show {
        /// Transaction ID (parent or leg)
        id: String,
    },
    /// Split a transaction into legs
    Split {
        /// Transaction ID
        id: String,
        /// Split leg, repeatable
        #[arg(
            long = "leg",
            value_name = "AMOUNT[:CATEGORY]",
            required = true,
            allow_hyphen_values = true
        )]
        legs: Vec<String>,
        /// Confirm changes to reconciled transactions
        #[arg(short, long)]
        yes: bool,
    },
    /// Edit one field of a transaction or one of its legs
    Edit {
        /// Transaction ID (parent or leg)
        id: String,
        /// Field: account, payee, category, amount, date, notes, cleared
        #[arg(short, long)]
        field: String,
        /// New value; empty clears account, payee and category
        #[arg(long, allow_hyphen_values = true)]
        value: String,
        /// Row to edit when it differs from ID
        #[arg(short, long)]
        row: Option<String>,
        /// Confirm changes to reconciled transactions
        #[arg(short, long)]
        yes: bool,
    },
    /// Clear the reconciled flag so a transaction can be edited
    Unlock {
        /// Transaction ID (parent or leg)
        id: String,
        /// Row to unlock when it differs from ID
        #[arg(short, long)]
        row: Option<String>,
        /// Confirm unlocking
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a leg, or the whole transaction
    Delete {
        /// Transaction ID (parent or leg)
        id: String,
        /// Row to delete when it differs from ID
        #[arg(short, long)]
        row: Option<String>,
        /// Confirm deleting reconciled transactions
        #[arg(short, long)]
        yes: bool,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> SplitbookResult<()> {
    let options = SessionOptions::from(settings);
    let format = settings.date_format;

    match cmd {
        TransactionCommands::Add {
            amount,
            account,
            payee,
            category,
            date,
            notes,
            cleared,
            legs,
        } => {
            let legs = parse_legs(&legs)?;
            let last = storage.last_transaction()?;
            let mut session =
                SplitSession::begin_new(last.as_ref(), Local::now().date_naive(), options);
            let parent_id = session_parent(&session)?;

            if let Some(account) = account {
                session.edit(&parent_id, FieldEdit::parse(TransactionField::Account, &account)?)?;
            }
            if let Some(date) = date {
                session.edit(&parent_id, FieldEdit::Date(date))?;
            }
            if let Some(payee) = payee {
                let edit = FieldEdit::parse(TransactionField::Payee, &payee)?;
                session.edit_with_rules(&parent_id, edit, storage)?;
            }
            session.edit(&parent_id, FieldEdit::parse(TransactionField::Amount, &amount)?)?;
            if let Some(category) = category {
                session.edit(&parent_id, FieldEdit::parse(TransactionField::Category, &category)?)?;
            }
            if let Some(notes) = notes {
                session.edit(&parent_id, FieldEdit::Notes(notes))?;
            }
            if cleared {
                session.edit(&parent_id, FieldEdit::Cleared(true))?;
            }

            add_legs(&mut session, &parent_id, legs)?;

            let outcome = session.commit_with(storage, storage, &mut FixedAnswer(false))?;
            report_commit(outcome, "Created transaction:", format)?;
        }

        TransactionCommands::List { page, page_size } => {
            let page = page.max(1);
            let mut pager = storage.pager(page_size.unwrap_or(settings.page_size));

            let mut rows = pager.run()?;
            for _ in 1..page {
                rows = pager.fetch_next()?;
            }
            let has_more = pager.has_more();
            pager.unsubscribe();

            print!("{}", format_transaction_register(&rows, format));
            println!("\nPage {} ({} transactions)", page, rows.len());
            if has_more {
                println!("More: use --page {}", page + 1);
            }
        }

        TransactionCommands::Show { id } => {
            let group = storage.fetch_group(&TransactionId::from(id))?;
            print!("{}", format_working_set(&group.ungroup(), format));
        }

        TransactionCommands::Split { id, legs, yes } => {
            let legs = parse_legs(&legs)?;
            let mut session = SplitSession::load(storage, &TransactionId::from(id), options)?;
            let parent_id = session_parent(&session)?;

            add_legs(&mut session, &parent_id, legs)?;

            let outcome = session.commit_with(storage, storage, &mut FixedAnswer(yes))?;
            report_commit(outcome, "Split transaction:", format)?;
        }

        TransactionCommands::Edit {
            id,
            field,
            value,
            row,
            yes,
        } => {
            let id = TransactionId::from(id);
            let row = row.map(TransactionId::from).unwrap_or_else(|| id.clone());
            let field = TransactionField::parse(&field).ok_or_else(|| {
                SplitbookError::Validation(format!(
                    "Unknown field: '{}'. Use account, payee, category, amount, date, notes or cleared",
                    field
                ))
            })?;

            let mut session = SplitSession::load(storage, &id, options)?;
            session.request_active_edit(&row, field, None)?;
            session.stage_edit(value);
            session.flush_pending_edit()?;

            let outcome = session.commit_with(storage, storage, &mut FixedAnswer(yes))?;
            report_commit(outcome, "Updated transaction:", format)?;
        }

        TransactionCommands::Unlock { id, row, yes } => {
            let id = TransactionId::from(id);
            let row = row.map(TransactionId::from).unwrap_or_else(|| id.clone());

            let mut session = SplitSession::load(storage, &id, options)?;
            let pending = session.request_unlock(&row)?;
            if !yes {
                println!("{}", pending.reason().message());
                println!("Use --yes to confirm unlocking");
                return Ok(());
            }
            session.confirm_unlock(pending)?;

            let outcome = session.commit_with(storage, storage, &mut FixedAnswer(yes))?;
            report_commit(outcome, "Unlocked:", format)?;
        }

        TransactionCommands::Delete { id, row, yes } => {
            let id = TransactionId::from(id);
            let row = row.map(TransactionId::from).unwrap_or_else(|| id.clone());

            let mut session = SplitSession::load(storage, &id, options)?;
            match session.request_delete(&row)? {
                Guarded::Done(_) => {}
                Guarded::NeedsConfirmation(pending) if yes => {
                    session.confirm_delete(pending)?;
                }
                Guarded::NeedsConfirmation(pending) => {
                    println!("{}", pending.reason().message());
                    println!("Use --yes to confirm deletion");
                    return Ok(());
                }
            }

            let outcome = session.commit_with(storage, storage, &mut FixedAnswer(yes))?;
            report_commit(outcome, "Deleted:", format)?;
        }
    }

    Ok(())
}

/// Parse `AMOUNT[:CATEGORY]`; a leg must carry a non-zero amount
pub fn parse_leg(spec: &str) -> SplitbookResult<(Decimal, Option<CategoryId>)> {
    let (amount, category) = match spec.split_once(':') {
        Some((amount, category)) => (amount, Some(category)),
        None => (spec, None),
    };

    let amount = parse_decimal(amount).map_err(|e| {
        SplitbookError::Validation(format!("Invalid leg amount in '{}': {}", spec, e))
    })?;
    if amount.is_zero() {
        return Err(SplitbookError::Validation(format!(
            "Leg amount in '{}' must not be zero",
            spec
        )));
    }
    let category = category
        .map(|c| {
            CategoryId::parse(c.trim()).map_err(|_| {
                SplitbookError::Validation(format!("Invalid leg category in '{}'", spec))
            })
        })
        .transpose()?;

    Ok((amount, category))
}

fn parse_legs(specs: &[String]) -> SplitbookResult<Vec<(Decimal, Option<CategoryId>)>> {
    specs.iter().map(|s| parse_leg(s)).collect()
}

fn session_parent(session: &SplitSession) -> SplitbookResult<TransactionId> {
    session
        .parent()
        .map(|p| p.id.clone())
        .ok_or_else(|| SplitbookError::Validation("Edit session is empty".into()))
}

/// Split the parent if needed, then fill one leg per spec
fn add_legs(
    session: &mut SplitSession,
    parent_id: &TransactionId,
    legs: Vec<(Decimal, Option<CategoryId>)>,
) -> SplitbookResult<()> {
    for (amount, category) in legs {
        let is_split = session.get(parent_id)?.is_parent;
        let leg_id = if is_split {
            match session.add_split(parent_id)? {
                AddSplitOutcome::Added(id) | AddSplitOutcome::EmptySplitFound(id) => id,
            }
        } else {
            session.split(parent_id)?
        };

        session.edit(&leg_id, FieldEdit::Amount(amount))?;
        if category.is_some() {
            session.edit(&leg_id, FieldEdit::Category(category))?;
        }
    }
    Ok(())
}

fn report_commit(outcome: CommitOutcome, heading: &str, format: DateFormat) -> SplitbookResult<()> {
    match outcome {
        CommitOutcome::Committed(report) => {
            println!("{} {}", heading, format_changes(&report.changes));
            print!("{}", format_working_set(&report.transactions, format));
            Ok(())
        }
        CommitOutcome::NothingToCommit => {
            println!("No changes to save.");
            Ok(())
        }
        CommitOutcome::Unbalanced { difference } => Err(SplitbookError::Validation(format!(
            "Split legs do not add up to the total: {} unallocated",
            difference
        ))),
        CommitOutcome::MissingAccount => Err(SplitbookError::Validation(
            "Every transaction needs an account. Use --account".into(),
        )),
        CommitOutcome::AwaitingConfirmation(pending) => {
            println!("{}", pending.reason().message());
            println!("Use --yes to confirm");
            Ok(())
        }
    }
}
