//! The record being reported on
//!
//! [`Details`] bundles whatever of an entry, a transaction and an account is
//! in scope for one render call, together with the journal they live in and
//! the per-report state. Format elements and value expressions read from it
//! and never mutate it.

use chrono::NaiveDate;

use crate::expr::Value;
use crate::journal::{Account, Entry, Journal, Transaction, TransactionState};
use crate::xdata::ReportState;

/// Borrowed view of the current entry, transaction and account
#[derive(Debug, Clone, Copy)]
pub struct Details<'a> {
    /// Journal owning the records
    pub journal: &'a Journal,
    /// Per-report display flags and totals
    pub state: &'a ReportState,
    /// Current entry, if any
    pub entry: Option<&'a Entry>,
    /// Current transaction, if any
    pub xact: Option<&'a Transaction>,
    /// Current account, if any
    pub account: Option<&'a Account>,
    /// Date used when neither a transaction nor an entry is in scope
    pub date: Option<NaiveDate>,
    /// Replaces the account's value and total when set
    pub value: Option<&'a Value>,
}

impl<'a> Details<'a> {
    /// Empty details; every field element renders blank
    pub fn new(journal: &'a Journal, state: &'a ReportState) -> Self {
        Self { journal, state, entry: None, xact: None, account: None, date: None, value: None }
    }

    /// Details for an entry
    pub fn for_entry(journal: &'a Journal, state: &'a ReportState, entry: &'a Entry) -> Self {
        Self::new(journal, state).with_entry(entry)
    }

    /// Details for a transaction, with its entry and account in scope
    pub fn for_xact(journal: &'a Journal, state: &'a ReportState, xact: &'a Transaction) -> Self {
        Self {
            entry: Some(journal.entry(xact.entry)),
            xact: Some(xact),
            account: Some(journal.account(xact.account)),
            ..Self::new(journal, state)
        }
    }

    /// Details for an account
    pub fn for_account(journal: &'a Journal, state: &'a ReportState, account: &'a Account) -> Self {
        Self::new(journal, state).with_account(account)
    }

    /// Put an entry in scope
    pub fn with_entry(mut self, entry: &'a Entry) -> Self {
        self.entry = Some(entry);
        self
    }

    /// Put an account in scope
    pub fn with_account(mut self, account: &'a Account) -> Self {
        self.account = Some(account);
        self
    }

    /// Override the account's value and total
    pub fn with_value(mut self, value: &'a Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Set the fallback date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Actual date of the transaction, else the entry, else the fallback
    pub fn report_date(&self) -> Option<NaiveDate> {
        match (self.xact, self.entry) {
            (Some(xact), Some(entry)) => Some(xact.actual_date(entry)),
            (Some(xact), None) => xact.date.or(self.date),
            (None, Some(entry)) => Some(entry.date),
            (None, None) => self.date,
        }
    }

    /// Effective date of the transaction or entry, if one differs
    pub fn effective_date(&self) -> Option<NaiveDate> {
        match (self.xact, self.entry) {
            (Some(xact), Some(entry)) => xact.effective_date(entry),
            (Some(xact), None) => xact.effective_date,
            (None, Some(entry)) => entry.effective_date,
            (None, None) => None,
        }
    }

    /// Clearing state of the transaction, else the agreed state of the entry
    pub fn state_of(&self) -> Option<TransactionState> {
        match (self.xact, self.entry) {
            (Some(xact), _) => Some(xact.state),
            (None, Some(entry)) => self.journal.entry_state(entry),
            (None, None) => None,
        }
    }
}
