use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use splitbook::cli::{
    handle_rule_command, handle_transaction_command, RuleCommands, TransactionCommands,
};
use splitbook::config::{SplitbookPaths, Settings};
use splitbook::models::DateFormat;
use splitbook::storage::Storage;

#[derive(Parser)]
#[command(
    name = "splitbook",
    author = "Kaylee Beyene",
    version,
    about = "Edit transactions and their split legs from the terminal",
    long_about = "splitbook edits one transaction at a time: split it across \
                  categories, fix a leg, or delete it. Changes are checked for \
                  balance and saved as a single batch."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Transaction commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Payee rules used to auto-fill new transactions
    #[command(subcommand)]
    Rule(RuleCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        count: usize,
    },

    /// Show or change configuration
    Config {
        /// Date format: MM/dd/yyyy, dd/MM/yyyy, yyyy-MM-dd, MM.dd.yyyy, dd.MM.yyyy
        #[arg(long)]
        date_format: Option<String>,
        /// Rows per page when listing
        #[arg(long)]
        page_size: Option<usize>,
        /// Ask before deleting a single leg of a reconciled split
        #[arg(long)]
        confirm_child_delete: Option<bool>,
        /// Write committed changes to the audit log
        #[arg(long)]
        audit: Option<bool>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SPLITBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = SplitbookPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;

    let mut storage = Storage::new(paths.clone())?.with_audit(settings.audit_enabled);
    storage.load_all()?;

    match cli.command {
        Some(Commands::Transaction(cmd)) => {
            handle_transaction_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Rule(cmd)) => {
            handle_rule_command(&storage, cmd)?;
        }
        Some(Commands::Audit { count }) => {
            let entries = storage.audit().read_recent(count)?;
            if entries.is_empty() {
                println!("Audit log is empty.");
            }
            for entry in &entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Config {
            date_format,
            page_size,
            confirm_child_delete,
            audit,
        }) => {
            let mut changed = false;
            if let Some(format) = date_format {
                let Some(format) = DateFormat::parse(&format) else {
                    bail!("Unknown date format: '{}'", format);
                };
                settings.date_format = format;
                changed = true;
            }
            if let Some(size) = page_size {
                settings.page_size = size.max(1);
                changed = true;
            }
            if let Some(confirm) = confirm_child_delete {
                settings.confirm_reconciled_child_delete = confirm;
                changed = true;
            }
            if let Some(enabled) = audit {
                settings.audit_enabled = enabled;
                changed = true;
            }
            if changed {
                settings.save(&paths)?;
            }

            println!("splitbook Configuration");
            println!("=======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Date format:          {}", settings.date_format);
            println!("  Page size:            {}", settings.page_size);
            println!(
                "  Confirm child delete: {}",
                settings.confirm_reconciled_child_delete
            );
            println!("  Audit enabled:        {}", settings.audit_enabled);
        }
        None => {
            println!("splitbook - split transaction editor");
            println!();
            println!("Run 'splitbook --help' for usage information.");
        }
    }

    Ok(())
}
