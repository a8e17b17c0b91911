//! The split edit session
//!
//! `SplitSession` owns a private copy of one split group for as long as it
//! is being edited. Every change goes through it, and nothing reaches
//! storage until `commit`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{
    parse_decimal, AccountId, CategoryId, DateFormat, EditableTransaction, Money, PayeeId,
    Transaction, TransactionField, TransactionGroup, TransactionId,
};

use super::active_edit::{ActiveEditCoordinator, FieldKey, OnActivate};
use super::autofill::{autofill, merge_suggestion, AutofillRequest};
use super::boundary::{BatchPersistence, LastTransactionStore, RuleEngine, TransactionSource};
use super::commit::{persist, validate, CommitOutcome};
use super::diff::{diff_items, Changes};
use super::guard::{Confirmer, GuardedAction, Guarded, PendingConfirmation, ReconciliationGuard};
use super::serialize::{deserialize, serialize};
use super::splits;

/// A new value for one field of a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Account(Option<AccountId>),
    Payee(Option<PayeeId>),
    Category(Option<CategoryId>),
    Amount(Decimal),
    /// Date text in the session's date format
    Date(String),
    Notes(String),
    Cleared(bool),
}

impl FieldEdit {
    pub fn field(&self) -> TransactionField {
        match self {
            Self::Account(_) => TransactionField::Account,
            Self::Payee(_) => TransactionField::Payee,
            Self::Category(_) => TransactionField::Category,
            Self::Amount(_) => TransactionField::Amount,
            Self::Date(_) => TransactionField::Date,
            Self::Notes(_) => TransactionField::Notes,
            Self::Cleared(_) => TransactionField::Cleared,
        }
    }

    /// Build an edit from text typed into `field`
    ///
    /// Empty text clears a reference field.
    pub fn parse(field: TransactionField, text: &str) -> SplitbookResult<Self> {
        let text = text.trim();
        let invalid = |what: &str| SplitbookError::Validation(format!("Invalid {}: {}", what, text));

        Ok(match field {
            TransactionField::Account => Self::Account(match text {
                "" => None,
                _ => Some(AccountId::parse(text).map_err(|_| invalid("account"))?),
            }),
            TransactionField::Payee => Self::Payee(match text {
                "" => None,
                _ => Some(PayeeId::parse(text).map_err(|_| invalid("payee"))?),
            }),
            TransactionField::Category => Self::Category(match text {
                "" => None,
                _ => Some(CategoryId::parse(text).map_err(|_| invalid("category"))?),
            }),
            TransactionField::Amount => {
                Self::Amount(parse_decimal(text).map_err(|_| invalid("amount"))?)
            }
            TransactionField::Date => Self::Date(text.to_string()),
            TransactionField::Notes => Self::Notes(text.to_string()),
            TransactionField::Cleared => Self::Cleared(match text.to_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => true,
                "false" | "no" | "n" | "0" | "" => false,
                _ => return Err(invalid("cleared flag")),
            }),
        })
    }

    fn apply(self, editable: &mut EditableTransaction) {
        match self {
            Self::Account(v) => editable.account = v,
            Self::Payee(v) => editable.payee = v,
            Self::Category(v) => editable.category = v,
            Self::Amount(v) => editable.amount = v,
            Self::Date(v) => editable.date = v,
            Self::Notes(v) => editable.notes = v,
            Self::Cleared(v) => editable.cleared = v,
        }
    }
}

/// Result of asking for another split leg
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddSplitOutcome {
    Added(TransactionId),
    /// An empty leg already exists; focus it instead
    EmptySplitFound(TransactionId),
}

/// Per-session preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub date_format: DateFormat,
    pub confirm_reconciled_child_delete: bool,
}

impl From<&Settings> for SessionOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            date_format: settings.date_format,
            confirm_reconciled_child_delete: settings.confirm_reconciled_child_delete,
        }
    }
}

/// An edit session over one parent transaction and its legs
#[derive(Debug)]
pub struct SplitSession {
    id: Uuid,
    original: Vec<Transaction>,
    rows: Vec<Transaction>,
    adding: bool,
    options: SessionOptions,
    guard: ReconciliationGuard,
    active_edit: ActiveEditCoordinator,
}

impl SplitSession {
    fn with_rows(
        original: Vec<Transaction>,
        rows: Vec<Transaction>,
        adding: bool,
        options: SessionOptions,
    ) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            original,
            rows,
            adding,
            options,
            guard: ReconciliationGuard::new(options.confirm_reconciled_child_delete),
            active_edit: ActiveEditCoordinator::new(),
        };
        debug!(session = %session.id, rows = session.rows.len(), adding, "Opened split session");
        session
    }

    /// Edit an existing split group
    pub fn open(group: TransactionGroup, options: SessionOptions) -> Self {
        let rows = group.ungroup();
        Self::with_rows(rows.clone(), rows, false, options)
    }

    /// Fetch a group from `source` and edit it
    pub fn load(
        source: &dyn TransactionSource,
        parent_id: &TransactionId,
        options: SessionOptions,
    ) -> SplitbookResult<Self> {
        Ok(Self::open(source.fetch_group(parent_id)?, options))
    }

    /// Start a new transaction seeded with the last-used account and date
    pub fn begin_new(last: Option<&Transaction>, today: NaiveDate, options: SessionOptions) -> Self {
        let parent = Transaction::temporary(
            last.and_then(|t| t.account),
            last.map_or(today, |t| t.date),
            Money::zero(),
        );
        Self::with_rows(Vec::new(), vec![parent], true, options)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the session creates a new transaction
    pub fn is_adding(&self) -> bool {
        self.adding
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// The working set, `[parent, legs...]`
    pub fn transactions(&self) -> &[Transaction] {
        &self.rows
    }

    /// `None` once the whole group has been deleted
    pub fn parent(&self) -> Option<&Transaction> {
        self.rows.first()
    }

    pub fn get(&self, id: &TransactionId) -> SplitbookResult<&Transaction> {
        self.rows
            .iter()
            .find(|t| &t.id == id)
            .ok_or_else(|| SplitbookError::NotInSession { id: id.clone() })
    }

    /// A row in its editable form
    pub fn serialized(&self, id: &TransactionId) -> SplitbookResult<EditableTransaction> {
        Ok(serialize(self.get(id)?, self.options.date_format))
    }

    /// The batch a commit would send right now, before realizing ids
    pub fn pending_changes(&self) -> Changes {
        diff_items(&self.original, &self.rows)
    }

    pub fn active_edit(&self) -> &ActiveEditCoordinator {
        &self.active_edit
    }

    /// Make one field of one row the only editable field
    pub fn request_active_edit(
        &mut self,
        id: &TransactionId,
        field: TransactionField,
        on_activate: Option<OnActivate>,
    ) -> SplitbookResult<bool> {
        self.get(id)?;
        Ok(self
            .active_edit
            .request_active_edit(FieldKey::new(id.clone(), field), on_activate))
    }

    pub fn clear_active_edit(&mut self) {
        self.active_edit.clear_active_edit();
    }

    /// Keep text typed into the active field until it is flushed
    pub fn stage_edit(&mut self, text: impl Into<String>) -> bool {
        self.active_edit.stage(text)
    }

    /// Apply staged text of the active field and release it
    ///
    /// Returns whether anything was applied.
    pub fn flush_pending_edit(&mut self) -> SplitbookResult<bool> {
        let pending = self.active_edit.take_pending();
        self.active_edit.clear_active_edit();

        match pending {
            Some((key, text)) => {
                let edit = FieldEdit::parse(key.field, &text)?;
                self.edit(&key.transaction_id, edit)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Change one field of one row
    pub fn edit(&mut self, id: &TransactionId, edit: FieldEdit) -> SplitbookResult<&[Transaction]> {
        self.apply_edit(id, edit, None)
    }

    /// Change one field and let the rule engine fill the rest of a new row
    pub fn edit_with_rules(
        &mut self,
        id: &TransactionId,
        edit: FieldEdit,
        rules: &dyn RuleEngine,
    ) -> SplitbookResult<&[Transaction]> {
        self.apply_edit(id, edit, Some(rules))
    }

    fn apply_edit(
        &mut self,
        id: &TransactionId,
        edit: FieldEdit,
        rules: Option<&dyn RuleEngine>,
    ) -> SplitbookResult<&[Transaction]> {
        let key = FieldKey::new(id.clone(), edit.field());
        if self.active_edit.is_disabled(&key) {
            return Err(SplitbookError::Validation(format!(
                "Cannot edit {} while another field is active",
                key
            )));
        }

        let current = self.get(id)?;
        let mut editable = serialize(current, self.options.date_format);
        edit.apply(&mut editable);

        let mut updated = deserialize(&editable, Some(current), self.options.date_format);
        if let Some(rules) = rules {
            updated = autofill(&updated, rules);
        }

        self.rows = splits::update_transaction(&self.rows, updated)?;
        debug!(session = %self.id, field = %key, "Edited transaction");

        if self.active_edit.is_editing(&key) {
            self.active_edit.clear_active_edit();
        }
        Ok(&self.rows)
    }

    /// Ask the rule engine about a row; `None` for saved rows
    pub fn begin_autofill(&self, id: &TransactionId) -> SplitbookResult<Option<AutofillRequest>> {
        let row = self.get(id)?;
        Ok(row.is_temporary().then(|| AutofillRequest {
            session_id: self.id,
            transaction: row.clone(),
        }))
    }

    /// Merge the rule engine's answer into the row as it is now
    ///
    /// Answers for another session, a deleted row or a row that has been
    /// saved in the meantime are dropped. Returns whether anything merged.
    pub fn finish_autofill(&mut self, request: AutofillRequest, suggestion: &Transaction) -> bool {
        if request.session_id != self.id {
            warn!(transaction = %request.transaction.id, "Dropped rule suggestion for another session");
            return false;
        }

        let current = match self.rows.iter().find(|t| t.id == request.transaction.id) {
            Some(row) if row.is_temporary() => row,
            _ => {
                warn!(transaction = %request.transaction.id, "Dropped stale rule suggestion");
                return false;
            }
        };

        let merged = merge_suggestion(current, suggestion);
        match splits::update_transaction(&self.rows, merged) {
            Ok(rows) => {
                self.rows = rows;
                true
            }
            Err(_) => false,
        }
    }

    /// Turn a plain row into a split with one empty leg
    pub fn split(&mut self, id: &TransactionId) -> SplitbookResult<TransactionId> {
        let (rows, child_id) = splits::split_transaction(&self.rows, id)?;
        self.rows = rows;
        debug!(session = %self.id, parent = %id, "Split transaction");
        Ok(child_id)
    }

    /// Add a leg to the group containing `id`, unless an empty one exists
    pub fn add_split(&mut self, id: &TransactionId) -> SplitbookResult<AddSplitOutcome> {
        if let Some(empty) = splits::find_empty_split(&self.rows, id)? {
            return Ok(AddSplitOutcome::EmptySplitFound(empty.id.clone()));
        }

        let (rows, child_id) = splits::add_split(&self.rows, id)?;
        self.rows = rows;
        debug!(session = %self.id, leg = %child_id, "Added split leg");
        Ok(AddSplitOutcome::Added(child_id))
    }

    /// Delete a leg, or the whole group when `id` is the parent
    ///
    /// Returns the changes now pending, so persisted rows show up as
    /// deletions at commit.
    pub fn request_delete(&mut self, id: &TransactionId) -> SplitbookResult<Guarded<Changes>> {
        self.get(id)?;

        match self.guard.check_delete(&self.rows, id) {
            Some(reason) => Ok(Guarded::NeedsConfirmation(PendingConfirmation {
                session_id: self.id,
                reason,
                action: GuardedAction::Delete(id.clone()),
            })),
            None => self.delete_now(id).map(Guarded::Done),
        }
    }

    /// Run a delete the user has confirmed
    pub fn confirm_delete(&mut self, pending: PendingConfirmation) -> SplitbookResult<Changes> {
        self.check_pending(&pending)?;
        match pending.action {
            GuardedAction::Delete(id) => self.delete_now(&id),
            other => Err(mismatched(&other, "delete")),
        }
    }

    /// Delete, asking `confirmer` when the guard requires it
    ///
    /// Returns `None` when the user declined.
    pub fn delete_with(
        &mut self,
        id: &TransactionId,
        confirmer: &mut dyn Confirmer,
    ) -> SplitbookResult<Option<Changes>> {
        match self.request_delete(id)? {
            Guarded::Done(changes) => Ok(Some(changes)),
            Guarded::NeedsConfirmation(pending) => {
                if confirmer.confirm(pending.reason()) {
                    self.confirm_delete(pending).map(Some)
                } else {
                    debug!(session = %self.id, transaction = %id, "Delete declined");
                    Ok(None)
                }
            }
        }
    }

    fn delete_now(&mut self, id: &TransactionId) -> SplitbookResult<Changes> {
        self.rows = splits::delete_transaction(&self.rows, id)?;
        debug!(session = %self.id, transaction = %id, "Deleted transaction");

        self.release_orphaned_edit();
        Ok(self.pending_changes())
    }

    /// Ask to clear the reconciled flag of a row
    ///
    /// Unlocking always needs confirmation. Rows that are not reconciled
    /// cannot be unlocked.
    pub fn request_unlock(&self, id: &TransactionId) -> SplitbookResult<PendingConfirmation> {
        self.get(id)?;

        match self.guard.check_unlock(&self.rows, id) {
            Some(reason) => Ok(PendingConfirmation {
                session_id: self.id,
                reason,
                action: GuardedAction::Unlock(id.clone()),
            }),
            None => Err(SplitbookError::Validation(format!(
                "Transaction {} is not reconciled",
                id
            ))),
        }
    }

    /// Run an unlock the user has confirmed
    ///
    /// Unlocking a parent unlocks its legs too. The change is saved with the
    /// next commit.
    pub fn confirm_unlock(&mut self, pending: PendingConfirmation) -> SplitbookResult<&[Transaction]> {
        self.check_pending(&pending)?;
        match pending.action {
            GuardedAction::Unlock(id) => self.unlock_now(&id),
            other => Err(mismatched(&other, "unlock")),
        }
    }

    /// Unlock, asking `confirmer` first
    ///
    /// Returns whether the row was unlocked.
    pub fn unlock_with(
        &mut self,
        id: &TransactionId,
        confirmer: &mut dyn Confirmer,
    ) -> SplitbookResult<bool> {
        let pending = self.request_unlock(id)?;
        if !confirmer.confirm(pending.reason()) {
            debug!(session = %self.id, transaction = %id, "Unlock declined");
            return Ok(false);
        }
        self.confirm_unlock(pending)?;
        Ok(true)
    }

    fn unlock_now(&mut self, id: &TransactionId) -> SplitbookResult<&[Transaction]> {
        let mut unlocked = self.get(id)?.clone();
        unlocked.reconciled = false;

        let mut rows = splits::update_transaction(&self.rows, unlocked)?;
        for leg in rows
            .iter_mut()
            .filter(|t| t.is_child && t.parent_id.as_ref() == Some(id))
        {
            leg.reconciled = false;
        }
        self.rows = rows;

        info!(session = %self.id, transaction = %id, "Unlocked reconciled transaction");
        Ok(&self.rows)
    }

    fn release_orphaned_edit(&mut self) {
        let orphaned = self
            .active_edit
            .active_key()
            .is_some_and(|key| !self.rows.iter().any(|t| t.id == key.transaction_id));
        if orphaned {
            self.active_edit.clear_active_edit();
        }
    }

    /// Save the working set
    ///
    /// Text staged in the active field is applied first. Incomplete or
    /// unbalanced sets are reported, not saved. Changes touching reconciled
    /// rows come back as `AwaitingConfirmation`.
    pub fn commit(
        &mut self,
        persistence: &dyn BatchPersistence,
        last: &dyn LastTransactionStore,
    ) -> SplitbookResult<CommitOutcome> {
        self.flush_pending_edit()?;
        if let Some(blocked) = self.precheck() {
            return Ok(blocked);
        }

        if let Some(reason) = self.guard.check_save(&self.original, &self.rows) {
            return Ok(CommitOutcome::AwaitingConfirmation(PendingConfirmation {
                session_id: self.id,
                reason,
                action: GuardedAction::Save,
            }));
        }

        self.persist_now(persistence, last)
    }

    /// Run a save the user has confirmed
    pub fn confirm_commit(
        &mut self,
        pending: PendingConfirmation,
        persistence: &dyn BatchPersistence,
        last: &dyn LastTransactionStore,
    ) -> SplitbookResult<CommitOutcome> {
        self.check_pending(&pending)?;
        if pending.action != GuardedAction::Save {
            return Err(mismatched(&pending.action, "save"));
        }

        self.flush_pending_edit()?;
        if let Some(blocked) = self.precheck() {
            return Ok(blocked);
        }
        self.persist_now(persistence, last)
    }

    /// Save, asking `confirmer` when the guard requires it
    pub fn commit_with(
        &mut self,
        persistence: &dyn BatchPersistence,
        last: &dyn LastTransactionStore,
        confirmer: &mut dyn Confirmer,
    ) -> SplitbookResult<CommitOutcome> {
        match self.commit(persistence, last)? {
            CommitOutcome::AwaitingConfirmation(pending) if confirmer.confirm(pending.reason()) => {
                self.confirm_commit(pending, persistence, last)
            }
            outcome => Ok(outcome),
        }
    }

    /// Give up on the session without saving anything
    pub fn discard(mut self) {
        self.active_edit.clear_active_edit();
        debug!(session = %self.id, "Discarded split session");
    }

    fn precheck(&self) -> Option<CommitOutcome> {
        if let Some(blocked) = validate(&self.rows) {
            return Some(blocked);
        }
        if self.pending_changes().is_empty() {
            return Some(CommitOutcome::NothingToCommit);
        }
        None
    }

    fn persist_now(
        &mut self,
        persistence: &dyn BatchPersistence,
        last: &dyn LastTransactionStore,
    ) -> SplitbookResult<CommitOutcome> {
        let report = persist(&self.original, &self.rows, self.adding, persistence, last)?;

        self.rows = report.transactions.clone();
        self.original = self.rows.clone();
        self.adding = false;
        self.release_orphaned_edit();

        Ok(CommitOutcome::Committed(report))
    }

    fn check_pending(&self, pending: &PendingConfirmation) -> SplitbookResult<()> {
        if pending.session_id != self.id {
            return Err(SplitbookError::Validation(
                "Confirmation belongs to a different session".into(),
            ));
        }
        Ok(())
    }
}

fn mismatched(action: &GuardedAction, expected: &str) -> SplitbookError {
    let held = match action {
        GuardedAction::Save => "save",
        GuardedAction::Delete(_) => "delete",
        GuardedAction::Unlock(_) => "unlock",
    };
    SplitbookError::Validation(format!(
        "Confirmation is for a {}, not a {}",
        held, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::guard::{ConfirmReason, FixedAnswer};
    use std::cell::RefCell;
    use std::str::FromStr;

    #[derive(Default)]
    struct RecordingStore {
        batches: RefCell<Vec<Changes>>,
        last: RefCell<Option<Transaction>>,
    }

    impl BatchPersistence for RecordingStore {
        fn batch_update(&self, changes: &Changes) -> SplitbookResult<Vec<Transaction>> {
            self.batches.borrow_mut().push(changes.clone());
            Ok(changes.added.iter().chain(&changes.updated).cloned().collect())
        }
    }

    impl LastTransactionStore for RecordingStore {
        fn last_transaction(&self) -> SplitbookResult<Option<Transaction>> {
            Ok(self.last.borrow().clone())
        }

        fn set_last_transaction(&self, transaction: &Transaction) -> SplitbookResult<()> {
            *self.last.borrow_mut() = Some(transaction.clone());
            Ok(())
        }
    }

    struct CategoryRule(CategoryId);

    impl RuleEngine for CategoryRule {
        fn run(&self, transaction: &Transaction) -> Transaction {
            let mut suggested = transaction.clone();
            suggested.category = Some(self.0);
            suggested
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn amount(s: &str) -> FieldEdit {
        FieldEdit::Amount(Decimal::from_str(s).unwrap())
    }

    fn existing(cents: i64) -> SplitSession {
        let parent = Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(cents));
        SplitSession::open(
            TransactionGroup {
                parent,
                subtransactions: vec![],
            },
            SessionOptions::default(),
        )
    }

    fn parent_id(session: &SplitSession) -> TransactionId {
        session.parent().unwrap().id.clone()
    }

    #[test]
    fn test_begin_new_uses_last_transaction() {
        let last = Transaction::new(Some(AccountId::new()), date(2025, 2, 2), Money::from_cents(-1));
        let session = SplitSession::begin_new(Some(&last), date(2025, 6, 6), SessionOptions::default());

        let parent = session.parent().unwrap();
        assert!(session.is_adding());
        assert!(parent.is_temporary());
        assert_eq!(parent.account, last.account);
        assert_eq!(parent.date, date(2025, 2, 2));
        assert_eq!(parent.amount, Money::zero());

        let fresh = SplitSession::begin_new(None, date(2025, 6, 6), SessionOptions::default());
        assert_eq!(fresh.parent().unwrap().date, date(2025, 6, 6));
        assert!(fresh.parent().unwrap().account.is_none());
    }

    #[test]
    fn test_edit_unknown_row_is_an_error() {
        let mut session = existing(-100);
        let err = session
            .edit(&TransactionId::from("elsewhere"), FieldEdit::Notes("x".into()))
            .unwrap_err();
        assert!(matches!(err, SplitbookError::NotInSession { .. }));
    }

    #[test]
    fn test_edit_date_keeps_previous_on_bad_input() {
        let mut session = existing(-100);
        let id = parent_id(&session);

        session.edit(&id, FieldEdit::Date("13/45".into())).unwrap();
        assert_eq!(session.get(&id).unwrap().date, date(2025, 5, 1));

        session.edit(&id, FieldEdit::Date("12/24/2024".into())).unwrap();
        assert_eq!(session.get(&id).unwrap().date, date(2024, 12, 24));
    }

    #[test]
    fn test_add_split_reuses_empty_leg() {
        let mut session = existing(-100);
        let id = parent_id(&session);
        let leg = session.split(&id).unwrap();

        assert_eq!(session.add_split(&id).unwrap(), AddSplitOutcome::EmptySplitFound(leg.clone()));

        session.edit(&leg, amount("-0.50")).unwrap();
        assert!(matches!(session.add_split(&leg).unwrap(), AddSplitOutcome::Added(_)));
        assert_eq!(session.transactions().len(), 3);
    }

    #[test]
    fn test_unbalanced_commit_sends_nothing() {
        let store = RecordingStore::default();
        let mut session = existing(-100);
        let id = parent_id(&session);
        session.split(&id).unwrap();

        let outcome = session.commit(&store, &store).unwrap();
        assert!(matches!(
            outcome,
            CommitOutcome::Unbalanced { difference } if difference == Money::from_cents(-100)
        ));
        assert!(store.batches.borrow().is_empty());
    }

    #[test]
    fn test_missing_account_aborts_commit() {
        let store = RecordingStore::default();
        let mut session = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        let id = parent_id(&session);
        session.edit(&id, amount("-5")).unwrap();

        let outcome = session.commit(&store, &store).unwrap();
        assert!(matches!(outcome, CommitOutcome::MissingAccount));
        assert!(store.batches.borrow().is_empty());
        assert!(store.last.borrow().is_none());
    }

    #[test]
    fn test_untouched_session_has_nothing_to_commit() {
        let store = RecordingStore::default();
        let mut session = existing(-100);
        assert!(matches!(
            session.commit(&store, &store).unwrap(),
            CommitOutcome::NothingToCommit
        ));
    }

    #[test]
    fn test_new_session_commit_realizes_and_remembers() {
        let store = RecordingStore::default();
        let account = AccountId::new();
        let mut session = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        let id = parent_id(&session);
        session.edit(&id, FieldEdit::Account(Some(account))).unwrap();
        session.edit(&id, amount("-20")).unwrap();
        let leg = session.split(&id).unwrap();
        session.edit(&leg, amount("-20")).unwrap();

        let report = match session.commit(&store, &store).unwrap() {
            CommitOutcome::Committed(report) => report,
            other => panic!("expected commit, got {:?}", other),
        };

        assert_eq!(report.changes.added.len(), 2);
        assert!(report.changes.added.iter().all(|t| !t.is_temporary()));
        assert_eq!(report.changes.added[1].parent_id, Some(report.changes.added[0].id.clone()));
        assert!(report.remembered_last);
        assert_eq!(store.last.borrow().as_ref(), Some(&report.changes.added[0]));
        assert!(!session.is_adding());

        assert!(matches!(
            session.commit(&store, &store).unwrap(),
            CommitOutcome::NothingToCommit
        ));
        assert_eq!(store.batches.borrow().len(), 1);
    }

    #[test]
    fn test_reconciled_save_needs_confirmation() {
        let store = RecordingStore::default();
        let mut parent = Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(-100));
        parent.reconciled = true;
        let mut session = SplitSession::open(
            TransactionGroup {
                parent: parent.clone(),
                subtransactions: vec![],
            },
            SessionOptions::default(),
        );
        session.edit(&parent.id, FieldEdit::Notes("fixed".into())).unwrap();

        let pending = match session.commit(&store, &store).unwrap() {
            CommitOutcome::AwaitingConfirmation(pending) => pending,
            other => panic!("expected confirmation, got {:?}", other),
        };
        assert_eq!(pending.reason(), ConfirmReason::EditReconciled);
        assert!(store.batches.borrow().is_empty());

        let outcome = session.confirm_commit(pending, &store, &store).unwrap();
        assert!(outcome.is_committed());
        assert_eq!(store.batches.borrow()[0].updated.len(), 1);
    }

    fn with_reconciled_leg() -> (SplitSession, TransactionId) {
        let mut parent =
            Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(-100));
        parent.is_parent = true;
        let mut leg = Transaction::child_of(&parent);
        leg.amount = Money::from_cents(-100);
        leg.reconciled = true;
        let leg_id = leg.id.clone();

        let session = SplitSession::open(
            TransactionGroup {
                parent,
                subtransactions: vec![leg],
            },
            SessionOptions::default(),
        );
        (session, leg_id)
    }

    #[test]
    fn test_reconciled_leg_save_needs_confirmation() {
        let store = RecordingStore::default();
        let (mut session, leg) = with_reconciled_leg();
        assert!(!session.parent().unwrap().reconciled);

        session.edit(&leg, FieldEdit::Notes("changed".into())).unwrap();

        let pending = match session.commit(&store, &store).unwrap() {
            CommitOutcome::AwaitingConfirmation(pending) => pending,
            other => panic!("expected confirmation, got {:?}", other),
        };
        assert_eq!(pending.reason(), ConfirmReason::EditReconciled);
        assert!(store.batches.borrow().is_empty());
    }

    #[test]
    fn test_parent_edit_reaching_reconciled_leg_is_guarded() {
        let store = RecordingStore::default();
        let (mut session, _) = with_reconciled_leg();
        let id = parent_id(&session);

        session.edit(&id, FieldEdit::Notes("parent only".into())).unwrap();
        assert!(session.commit(&store, &store).unwrap().is_committed());

        session.edit(&id, FieldEdit::Date("06/01/2025".into())).unwrap();
        assert!(matches!(
            session.commit(&store, &store).unwrap(),
            CommitOutcome::AwaitingConfirmation(_)
        ));
        assert_eq!(store.batches.borrow().len(), 1);
    }

    #[test]
    fn test_unlock_clears_reconciled_after_confirmation() {
        let store = RecordingStore::default();
        let mut parent =
            Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(-100));
        parent.reconciled = true;
        parent.is_parent = true;
        let mut leg = Transaction::child_of(&parent);
        leg.amount = Money::from_cents(-100);
        leg.reconciled = true;
        let mut session = SplitSession::open(
            TransactionGroup {
                parent: parent.clone(),
                subtransactions: vec![leg],
            },
            SessionOptions::default(),
        );

        assert!(!session.unlock_with(&parent.id, &mut FixedAnswer(false)).unwrap());
        assert!(session.get(&parent.id).unwrap().reconciled);

        let pending = session.request_unlock(&parent.id).unwrap();
        assert_eq!(pending.reason(), ConfirmReason::UnlockReconciled);
        session.confirm_unlock(pending).unwrap();
        assert!(session.transactions().iter().all(|t| !t.reconciled));

        let report = match session.commit(&store, &store).unwrap() {
            CommitOutcome::Committed(report) => report,
            other => panic!("expected commit, got {:?}", other),
        };
        assert_eq!(report.changes.updated.len(), 2);
        assert!(session.request_unlock(&parent.id).unwrap_err().is_validation());
    }

    #[test]
    fn test_unlock_confirmation_is_not_a_delete() {
        let mut parent =
            Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(-100));
        parent.reconciled = true;
        let mut session = SplitSession::open(
            TransactionGroup {
                parent: parent.clone(),
                subtransactions: vec![],
            },
            SessionOptions::default(),
        );

        let pending = session.request_unlock(&parent.id).unwrap();
        assert!(session.confirm_delete(pending).unwrap_err().is_validation());
        assert_eq!(session.transactions().len(), 1);
        assert!(session.get(&parent.id).unwrap().reconciled);
    }

    #[test]
    fn test_oversized_leg_edit_is_rejected() {
        let mut session = existing(i64::MAX);
        let id = parent_id(&session);
        let leg = session.split(&id).unwrap();

        let err = session.edit(&leg, amount("-0.01")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.get(&leg).unwrap().amount, Money::zero());
        assert_eq!(
            session.parent().unwrap().split_difference(),
            Money::from_cents(i64::MAX)
        );
    }

    #[test]
    fn test_commit_flushes_and_releases_active_edit() {
        let store = RecordingStore::default();
        let mut session = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        let id = parent_id(&session);
        session.edit(&id, FieldEdit::Account(Some(AccountId::new()))).unwrap();
        session.edit(&id, amount("-5")).unwrap();

        session.request_active_edit(&id, TransactionField::Notes, None).unwrap();
        session.stage_edit("typed but not flushed");

        let report = match session.commit(&store, &store).unwrap() {
            CommitOutcome::Committed(report) => report,
            other => panic!("expected commit, got {:?}", other),
        };
        assert_eq!(report.changes.added[0].notes, "typed but not flushed");
        assert!(session.active_edit().active_key().is_none());

        let saved = parent_id(&session);
        assert!(!saved.is_temporary());
        session.edit(&saved, FieldEdit::Notes("later".into())).unwrap();
        assert!(session
            .request_active_edit(&saved, TransactionField::Amount, None)
            .unwrap());
    }

    #[test]
    fn test_declined_save_changes_nothing() {
        let store = RecordingStore::default();
        let mut parent = Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(-100));
        parent.reconciled = true;
        let mut session = SplitSession::open(
            TransactionGroup {
                parent: parent.clone(),
                subtransactions: vec![],
            },
            SessionOptions::default(),
        );
        session.edit(&parent.id, FieldEdit::Cleared(true)).unwrap();

        let outcome = session.commit_with(&store, &store, &mut FixedAnswer(false)).unwrap();
        assert!(matches!(outcome, CommitOutcome::AwaitingConfirmation(_)));
        assert!(store.batches.borrow().is_empty());
        assert!(session.get(&parent.id).unwrap().cleared);
    }

    #[test]
    fn test_confirmation_from_other_session_rejected() {
        let mut parent = Transaction::new(Some(AccountId::new()), date(2025, 5, 1), Money::from_cents(-100));
        parent.reconciled = true;
        let group = TransactionGroup {
            parent: parent.clone(),
            subtransactions: vec![],
        };
        let mut first = SplitSession::open(group.clone(), SessionOptions::default());
        let mut second = SplitSession::open(group, SessionOptions::default());

        let pending = match first.request_delete(&parent.id).unwrap() {
            Guarded::NeedsConfirmation(pending) => pending,
            Guarded::Done(_) => panic!("delete should be guarded"),
        };
        assert!(second.confirm_delete(pending).unwrap_err().is_validation());
        assert_eq!(second.transactions().len(), 1);
    }

    #[test]
    fn test_edit_with_rules_only_for_new_rows() {
        let rule = CategoryRule(CategoryId::new());

        let mut adding = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        let id = parent_id(&adding);
        adding.edit_with_rules(&id, amount("-3"), &rule).unwrap();
        assert_eq!(adding.get(&id).unwrap().category, Some(rule.0));

        let mut saved = existing(-100);
        let id = parent_id(&saved);
        saved.edit_with_rules(&id, amount("-3"), &rule).unwrap();
        assert!(saved.get(&id).unwrap().category.is_none());
    }

    #[test]
    fn test_late_autofill_keeps_user_value() {
        let rule = CategoryRule(CategoryId::new());
        let mut session = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        let id = parent_id(&session);

        let request = session.begin_autofill(&id).unwrap().unwrap();
        let suggestion = request.run(&rule);

        let chosen = CategoryId::new();
        session.edit(&id, FieldEdit::Category(Some(chosen))).unwrap();

        assert!(session.finish_autofill(request, &suggestion));
        assert_eq!(session.get(&id).unwrap().category, Some(chosen));
    }

    #[test]
    fn test_autofill_for_other_session_is_dropped() {
        let rule = CategoryRule(CategoryId::new());
        let first = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        let request = first.begin_autofill(&parent_id(&first)).unwrap().unwrap();
        let suggestion = request.run(&rule);
        first.discard();

        let mut second = SplitSession::begin_new(None, date(2025, 1, 1), SessionOptions::default());
        assert!(!second.finish_autofill(request, &suggestion));
        assert!(second.parent().unwrap().category.is_none());
    }

    #[test]
    fn test_autofill_not_requested_for_saved_rows() {
        let session = existing(-100);
        assert!(session.begin_autofill(&parent_id(&session)).unwrap().is_none());
    }

    #[test]
    fn test_active_edit_blocks_other_fields() {
        let mut session = existing(-100);
        let id = parent_id(&session);

        assert!(session.request_active_edit(&id, TransactionField::Notes, None).unwrap());
        assert!(!session.request_active_edit(&id, TransactionField::Amount, None).unwrap());
        assert!(session.edit(&id, amount("-1")).unwrap_err().is_validation());

        session.edit(&id, FieldEdit::Notes("rent".into())).unwrap();
        assert!(session.active_edit().active_key().is_none());
        session.edit(&id, amount("-1")).unwrap();
    }

    #[test]
    fn test_flush_pending_edit_applies_staged_text() {
        let mut session = existing(-100);
        let id = parent_id(&session);

        assert!(!session.flush_pending_edit().unwrap());

        session.request_active_edit(&id, TransactionField::Amount, None).unwrap();
        assert!(session.stage_edit("-$12.34"));
        assert!(session.flush_pending_edit().unwrap());
        assert_eq!(session.get(&id).unwrap().amount, Money::from_cents(-1234));
        assert!(session.active_edit().active_key().is_none());
    }

    #[test]
    fn test_field_edit_parse() {
        assert_eq!(
            FieldEdit::parse(TransactionField::Cleared, "yes").unwrap(),
            FieldEdit::Cleared(true)
        );
        assert_eq!(
            FieldEdit::parse(TransactionField::Account, "").unwrap(),
            FieldEdit::Account(None)
        );
        assert!(FieldEdit::parse(TransactionField::Amount, "abc").unwrap_err().is_validation());
        assert!(FieldEdit::parse(TransactionField::Payee, "pay-xyz").unwrap_err().is_validation());
    }

    #[test]
    fn test_delete_persisted_leg_is_queued() {
        let store = RecordingStore::default();
        let mut session = existing(-100);
        let id = parent_id(&session);
        let leg = session.split(&id).unwrap();
        session.edit(&leg, amount("-100")).unwrap();
        assert!(session.commit(&store, &store).unwrap().is_committed());

        let changes = match session.request_delete(&leg).unwrap() {
            Guarded::Done(changes) => changes,
            Guarded::NeedsConfirmation(_) => panic!("leg delete should not be guarded"),
        };
        assert_eq!(changes.deleted.len(), 1);
        assert_eq!(changes.deleted[0].id, leg);
        assert_eq!(changes.updated.len(), 1);
        assert!(!session.parent().unwrap().is_parent);
    }
}
