//! Audit logging for committed transaction batches
//!
//! Every row added, updated or deleted by a commit becomes one line in the
//! append-only audit log.
//!
//! - `AuditEntry`: timestamp, operation, row id and kind, and before/after
//!   values.
//! - `AuditLogger`: appends entries to the log file as JSON lines.
//! - `entries_for`: turns a committed `Changes` batch into entries.
//! - `generate_diff`: field-level summary used for updates.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, Operation, RowKind};
pub use logger::{entries_for, AuditLogger};
