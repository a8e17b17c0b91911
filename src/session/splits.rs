//! Operations on a working set of split rows
//!
//! A working set is `[parent, child1, child2, ...]`. Every function here
//! takes the current rows and returns a new set, leaving the input intact.
//! The parent's split error is recomputed after every change.

use crate::error::{SplitbookError, SplitbookResult};
use crate::models::{Money, Transaction, TransactionError, TransactionId};

fn position(rows: &[Transaction], id: &TransactionId) -> SplitbookResult<usize> {
    rows.iter()
        .position(|t| &t.id == id)
        .ok_or_else(|| SplitbookError::NotInSession { id: id.clone() })
}

/// Index of the parent of the row at `index` (the row itself if top-level)
fn parent_position(rows: &[Transaction], index: usize) -> SplitbookResult<usize> {
    match &rows[index].parent_id {
        Some(parent_id) if rows[index].is_child => position(rows, parent_id),
        _ => Ok(index),
    }
}

/// Child legs of `parent_id`, in creation order
pub fn children<'a>(
    rows: &'a [Transaction],
    parent_id: &'a TransactionId,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    rows.iter()
        .filter(move |t| t.is_child && t.parent_id.as_ref() == Some(parent_id))
}

/// `parent.amount - sum(children.amount)`
///
/// Fails when the legs or the difference do not fit in an amount.
pub fn split_difference(parent: &Transaction, rows: &[Transaction]) -> SplitbookResult<Money> {
    children(rows, &parent.id)
        .try_fold(Money::zero(), |allocated, t| allocated.checked_add(t.amount))
        .and_then(|allocated| parent.amount.checked_sub(allocated))
        .ok_or_else(|| {
            SplitbookError::Validation(format!(
                "Split legs of {} are too large to add up",
                parent.id
            ))
        })
}

/// Recompute the split error on every parent in `rows`
pub fn recalculate_split(rows: &mut [Transaction]) -> SplitbookResult<()> {
    let view: &[Transaction] = rows;
    let errors = view
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_parent)
        .map(|(i, parent)| {
            let difference = split_difference(parent, view)?;
            let error = (!difference.is_zero())
                .then_some(TransactionError::SplitTransactionError { difference });
            Ok((i, error))
        })
        .collect::<SplitbookResult<Vec<(usize, Option<TransactionError>)>>>()?;

    for (i, error) in errors {
        rows[i].error = error;
    }
    Ok(())
}

/// Turn a plain transaction into a split with one empty leg
///
/// The transaction must have a non-zero amount and no legs yet.
pub fn split_transaction(
    rows: &[Transaction],
    id: &TransactionId,
) -> SplitbookResult<(Vec<Transaction>, TransactionId)> {
    let index = position(rows, id)?;
    let target = &rows[index];

    if target.is_child {
        return Err(SplitbookError::Validation(format!(
            "Transaction {} is already a split leg",
            id
        )));
    }
    if children(rows, id).next().is_some() {
        return Err(SplitbookError::Validation(format!(
            "Transaction {} is already split",
            id
        )));
    }
    if target.amount.is_zero() {
        return Err(SplitbookError::Validation(
            "Cannot split a transaction with a zero amount".into(),
        ));
    }

    let mut result = rows.to_vec();
    result[index].is_parent = true;
    let child = Transaction::child_of(&result[index]);
    let child_id = child.id.clone();
    result.insert(index + 1, child);

    recalculate_split(&mut result)?;
    Ok((result, child_id))
}

/// Append another empty leg to the split group containing `id`
///
/// `id` may name the parent or any of its legs.
pub fn add_split(
    rows: &[Transaction],
    id: &TransactionId,
) -> SplitbookResult<(Vec<Transaction>, TransactionId)> {
    let parent_index = parent_position(rows, position(rows, id)?)?;
    let parent = &rows[parent_index];

    if !parent.is_parent {
        return Err(SplitbookError::Validation(format!(
            "Transaction {} is not split",
            parent.id
        )));
    }

    let child = Transaction::child_of(parent);
    let child_id = child.id.clone();

    let insert_at = rows
        .iter()
        .rposition(|t| t.parent_id.as_ref() == Some(&parent.id))
        .map_or(parent_index + 1, |last| last + 1);

    let mut result = rows.to_vec();
    result.insert(insert_at, child);

    recalculate_split(&mut result)?;
    Ok((result, child_id))
}

/// The first leg of the group containing `id` that still has a zero amount
pub fn find_empty_split<'a>(
    rows: &'a [Transaction],
    id: &TransactionId,
) -> SplitbookResult<Option<&'a Transaction>> {
    let parent = &rows[parent_position(rows, position(rows, id)?)?];
    Ok(children(rows, &parent.id).find(|t| t.amount.is_zero()))
}

/// Remove a leg, or the whole group when `id` is a parent
///
/// Removing the last leg turns the parent back into a plain transaction.
pub fn delete_transaction(
    rows: &[Transaction],
    id: &TransactionId,
) -> SplitbookResult<Vec<Transaction>> {
    let index = position(rows, id)?;
    let target = &rows[index];

    if !target.is_child {
        return Ok(rows
            .iter()
            .filter(|t| &t.id != id && t.parent_id.as_ref() != Some(id))
            .cloned()
            .collect());
    }

    let parent_id = target.parent_id.clone();
    let mut result: Vec<Transaction> = rows.iter().filter(|t| &t.id != id).cloned().collect();

    if let Some(parent_id) = parent_id {
        if children(&result, &parent_id).next().is_none() {
            if let Some(parent) = result.iter_mut().find(|t| t.id == parent_id) {
                parent.is_parent = false;
                parent.error = None;
            }
        }
    }

    recalculate_split(&mut result)?;
    Ok(result)
}

/// Replace the row with `updated.id`
///
/// When a parent changes, its legs follow its account, date and cleared
/// state, and legs that shared the old payee take the new one.
pub fn update_transaction(
    rows: &[Transaction],
    updated: Transaction,
) -> SplitbookResult<Vec<Transaction>> {
    let index = position(rows, &updated.id)?;
    let previous_payee = rows[index].payee;
    let mut result = rows.to_vec();

    if updated.is_parent {
        for child in result
            .iter_mut()
            .filter(|t| t.is_child && t.parent_id.as_ref() == Some(&updated.id))
        {
            child.account = updated.account;
            child.date = updated.date;
            child.cleared = updated.cleared;
            if child.payee == previous_payee {
                child.payee = updated.payee;
            }
        }
    }

    result[index] = updated;
    recalculate_split(&mut result)?;
    Ok(result)
}

/// Give every temporary row a durable id, keeping legs attached to their
/// parent
pub fn realize_temp_transactions(rows: &[Transaction]) -> Vec<Transaction> {
    let renamed: Vec<(TransactionId, TransactionId)> = rows
        .iter()
        .filter(|t| t.is_temporary())
        .map(|t| (t.id.clone(), TransactionId::new()))
        .collect();

    let lookup = |id: &TransactionId| {
        renamed
            .iter()
            .find(|(old, _)| old == id)
            .map(|(_, new)| new.clone())
    };

    rows.iter()
        .map(|t| {
            let mut row = t.clone();
            if let Some(new_id) = lookup(&row.id) {
                row.id = new_id;
            }
            if let Some(new_parent) = row.parent_id.as_ref().and_then(lookup) {
                row.parent_id = Some(new_parent);
            }
            row
        })
        .collect()
}
