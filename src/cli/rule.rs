//! Payee rule CLI commands
//!
//! Rules are what auto-fill suggests for new transactions with a payee.

use clap::Subcommand;

use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{CategoryId, PayeeId};
use crate::storage::{PayeeRule, Storage};

/// Rule subcommands
#[derive(Subcommand)]
pub enum RuleCommands {
    /// List all payee rules
    List,
    /// Add or replace the rule for a payee
    Set {
        /// Payee ID
        payee: String,
        /// Category to suggest
        #[arg(short, long)]
        category: Option<String>,
        /// Notes to suggest
        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Handle a rule command
pub fn handle_rule_command(storage: &Storage, cmd: RuleCommands) -> SplitbookResult<()> {
    match cmd {
        RuleCommands::List => {
            let rules = storage.rules.get_all()?;
            if rules.is_empty() {
                println!("No rules defined.");
                return Ok(());
            }

            println!("{:14} {:14} {}", "Payee", "Category", "Notes");
            println!("{}", "-".repeat(50));
            for rule in &rules {
                let category = rule
                    .category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:14} {:14} {}",
                    rule.payee.to_string(),
                    category,
                    rule.notes.as_deref().unwrap_or("-")
                );
            }
        }

        RuleCommands::Set {
            payee,
            category,
            notes,
        } => {
            let payee = PayeeId::parse(&payee)
                .map_err(|_| SplitbookError::Validation(format!("Invalid payee: {}", payee)))?;
            let category = category
                .map(|c| {
                    CategoryId::parse(&c)
                        .map_err(|_| SplitbookError::Validation(format!("Invalid category: {}", c)))
                })
                .transpose()?;

            if category.is_none() && notes.is_none() {
                return Err(SplitbookError::Validation(
                    "A rule needs --category or --notes".into(),
                ));
            }

            storage.rules.upsert(PayeeRule {
                payee,
                category,
                notes,
            })?;
            storage.rules.save()?;
            println!("Saved rule for payee {}", payee);
        }
    }

    Ok(())
}
