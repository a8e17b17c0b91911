//! Split transaction editing
//!
//! A `SplitSession` holds one parent transaction and its legs while they are
//! edited, and turns the result into a single added/updated/deleted batch on
//! commit. The supporting pieces:
//!
//! - `serialize`: stored rows to and from their editable form
//! - `splits`: split, add leg, delete, update and realize on a working set
//! - `diff`: the batch between the fetched rows and the working set
//! - `autofill`: rule suggestions for rows that have never been saved
//! - `active_edit`: only one field of the session is editable at a time
//! - `guard`: confirmation before saving or deleting reconciled rows
//! - `boundary`: the storage and rule collaborators a session talks to

pub mod active_edit;
pub mod autofill;
pub mod boundary;
pub mod commit;
pub mod diff;
pub mod guard;
pub mod manager;
pub mod serialize;
pub mod splits;

pub use active_edit::{ActiveEditCoordinator, EditState, FieldKey, OnActivate, OnDeactivate};
pub use autofill::{autofill, merge_suggestion, AutofillRequest};
pub use boundary::{BatchPersistence, LastTransactionStore, RuleEngine, TransactionSource};
pub use commit::{CommitOutcome, CommitReport};
pub use diff::{apply_changes, diff_items, Changes};
pub use guard::{
    ConfirmReason, Confirmer, FixedAnswer, Guarded, GuardedAction, PendingConfirmation,
    ReconciliationGuard,
};
pub use manager::{AddSplitOutcome, FieldEdit, SessionOptions, SplitSession};
pub use serialize::{deserialize, serialize};
