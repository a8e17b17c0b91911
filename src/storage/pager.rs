//! Paged listing of top-level transactions
//!
//! Each pager is owned by its caller and keeps its own cursor. Pages are
//! ordered newest date first, ties broken by id, and continue from the last
//! row returned so rows added meanwhile do not shift later pages.

use chrono::NaiveDate;

use crate::error::SplitbookResult;
use crate::models::{Transaction, TransactionId};

use super::transactions::TransactionRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PagerState {
    Idle,
    Active {
        cursor: Option<(NaiveDate, TransactionId)>,
        has_more: bool,
    },
    Unsubscribed,
}

/// A cursor over plain transactions and split parents
pub struct TransactionPager<'a> {
    repo: &'a TransactionRepository,
    page_size: usize,
    state: PagerState,
}

fn after_cursor(txn: &Transaction, cursor: &Option<(NaiveDate, TransactionId)>) -> bool {
    match cursor {
        None => true,
        Some((date, id)) => txn.date < *date || (txn.date == *date && &txn.id > id),
    }
}

impl<'a> TransactionPager<'a> {
    /// A page size of zero is treated as one
    pub fn new(repo: &'a TransactionRepository, page_size: usize) -> Self {
        Self {
            repo,
            page_size: page_size.max(1),
            state: PagerState::Idle,
        }
    }

    /// Start over and return the first page
    ///
    /// Does nothing after `unsubscribe`.
    pub fn run(&mut self) -> SplitbookResult<Vec<Transaction>> {
        if self.state == PagerState::Unsubscribed {
            return Ok(Vec::new());
        }
        self.state = PagerState::Active {
            cursor: None,
            has_more: true,
        };
        self.fetch_next()
    }

    /// Return the page after the last one fetched
    ///
    /// Empty before `run`, after the last page, and after `unsubscribe`.
    pub fn fetch_next(&mut self) -> SplitbookResult<Vec<Transaction>> {
        let cursor = match &self.state {
            PagerState::Active {
                cursor,
                has_more: true,
            } => cursor.clone(),
            _ => return Ok(Vec::new()),
        };

        let mut page: Vec<Transaction> = self
            .repo
            .get_top_level()?
            .into_iter()
            .filter(|t| after_cursor(t, &cursor))
            .take(self.page_size + 1)
            .collect();

        let has_more = page.len() > self.page_size;
        page.truncate(self.page_size);

        let cursor = page.last().map(|t| (t.date, t.id.clone())).or(cursor);
        self.state = PagerState::Active { cursor, has_more };
        Ok(page)
    }

    pub fn has_more(&self) -> bool {
        matches!(self.state, PagerState::Active { has_more: true, .. })
    }

    /// Stop paging; later calls return nothing
    pub fn unsubscribe(&mut self) {
        self.state = PagerState::Unsubscribed;
    }
}
