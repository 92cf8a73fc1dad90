//! Per-report extended data
//!
//! Display flags, running totals and account sums are scratch state of a
//! single report pass. They live in a [`ReportState`] keyed by record id
//! instead of on the journal records, so a journal can be reported on any
//! number of times without being mutated.

use std::collections::HashMap;

use bitflags::bitflags;
use log::debug;

use crate::error::ReportResult;
use crate::expr::Value;
use crate::journal::{AccountId, Journal, XactId};

bitflags! {
    /// Display state of an account within one report
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AccountDisplay: u8 {
        /// Selected for output by the display selector or a grouper
        const TO_DISPLAY = 0x01;
        /// Already written by a grouper
        const DISPLAYED  = 0x02;
    }
}

bitflags! {
    /// Display state of a transaction within one report
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct XactDisplay: u8 {
        /// Part of the current output batch
        const TO_DISPLAY = 0x01;
        /// Already written by a grouper
        const DISPLAYED  = 0x02;
    }
}

/// Report data attached to an account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountXData {
    /// Display flags
    pub flags: AccountDisplay,
    /// Sum of the account's own transactions
    pub value: Value,
    /// Value plus the totals of all children
    pub total: Value,
    /// Number of own transactions
    pub count: usize,
    /// Number of transactions including children
    pub total_count: usize,
}

/// Report data attached to a transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XactXData {
    /// Display flags
    pub flags: XactDisplay,
    /// Running total up to and including this transaction
    pub total: Value,
    /// Position within the reported sequence
    pub index: usize,
}

/// Extended data for every record touched by a report
#[derive(Debug, Clone, Default)]
pub struct ReportState {
    accounts: HashMap<AccountId, AccountXData>,
    xacts: HashMap<XactId, XactXData>,
}

impl ReportState {
    /// Create empty report state
    pub fn new() -> Self {
        Self::default()
    }

    /// Account data, if any was recorded
    pub fn account(&self, id: AccountId) -> Option<&AccountXData> {
        self.accounts.get(&id)
    }

    /// Account data, created on first access
    pub fn account_mut(&mut self, id: AccountId) -> &mut AccountXData {
        self.accounts.entry(id).or_default()
    }

    /// Transaction data, if any was recorded
    pub fn xact(&self, id: XactId) -> Option<&XactXData> {
        self.xacts.get(&id)
    }

    /// Transaction data, created on first access
    pub fn xact_mut(&mut self, id: XactId) -> &mut XactXData {
        self.xacts.entry(id).or_default()
    }

    /// Check account display flags
    pub fn account_has_flags(&self, id: AccountId, flags: AccountDisplay) -> bool {
        self.account(id).is_some_and(|x| x.flags.contains(flags))
    }

    /// Set account display flags
    pub fn mark_account(&mut self, id: AccountId, flags: AccountDisplay) {
        self.account_mut(id).flags |= flags;
    }

    /// Check transaction display flags
    pub fn xact_has_flags(&self, id: XactId, flags: XactDisplay) -> bool {
        self.xact(id).is_some_and(|x| x.flags.contains(flags))
    }

    /// Set transaction display flags
    pub fn mark_xact(&mut self, id: XactId, flags: XactDisplay) {
        self.xact_mut(id).flags |= flags;
    }

    /// Clear transaction display flags
    pub fn unmark_xact(&mut self, id: XactId, flags: XactDisplay) {
        if let Some(xdata) = self.xacts.get_mut(&id) {
            xdata.flags.remove(flags);
        }
    }

    /// Reset display flags on every record, keeping sums
    pub fn clear_display_flags(&mut self) {
        for xdata in self.accounts.values_mut() {
            xdata.flags = AccountDisplay::empty();
        }
        for xdata in self.xacts.values_mut() {
            xdata.flags = XactDisplay::empty();
        }
    }

    /// Drop all report data
    pub fn clear(&mut self) {
        self.accounts.clear();
        self.xacts.clear();
    }

    /// Compute value, total and counts for every account of the journal
    ///
    /// Children always have larger ids than their parents, so walking the
    /// arena backwards folds each subtree before its parent is visited.
    pub fn sum_accounts(&mut self, journal: &Journal) -> ReportResult<()> {
        for account in journal.accounts() {
            let xdata = self.account_mut(account.id);
            xdata.value = Value::Null;
            xdata.count = 0;
        }
        for entry in journal.entries() {
            for xact in journal.entry_transactions(entry) {
                let xdata = self.account_mut(xact.account);
                xdata.value.add_assign(&Value::Amount(xact.amount.clone()))?;
                xdata.count += 1;
            }
        }

        let ids: Vec<AccountId> = journal.accounts().map(|a| a.id).collect();
        for &id in ids.iter().rev() {
            let account = journal.account(id);
            let mut total = self.account_mut(id).value.clone();
            let mut total_count = self.account_mut(id).count;
            for child in account.children.values() {
                if let Some(child_data) = self.account(*child) {
                    total.add_assign(&child_data.total)?;
                    total_count += child_data.total_count;
                }
            }
            let xdata = self.account_mut(id);
            xdata.total = total;
            xdata.total_count = total_count;
        }
        debug!("Summed {} accounts", ids.len());
        Ok(())
    }

    /// Record running totals and positions for a sequence of transactions
    pub fn accumulate_totals<I>(&mut self, journal: &Journal, xacts: I) -> ReportResult<()>
    where
        I: IntoIterator<Item = XactId>,
    {
        let mut running = Value::Null;
        for (index, id) in xacts.into_iter().enumerate() {
            running.add_assign(&Value::Amount(journal.xact(id).amount.clone()))?;
            let xdata = self.xact_mut(id);
            xdata.total = running.clone();
            xdata.index = index;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{Entry, Transaction};
    use chrono::NaiveDate;
    use ledger_math::Amount;

    fn sample() -> (Journal, Vec<XactId>) {
        let mut journal = Journal::new();
        let food = journal.find_account("Expenses:Food", true).unwrap();
        let fuel = journal.find_account("Expenses:Fuel", true).unwrap();
        let cash = journal.find_account("Assets:Cash", true).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let entry = journal.add_entry(Entry::new(date, "Errands"));
        let ids = vec![
            journal.add_transaction(entry, Transaction::new(food, Amount::parse("$7.00").unwrap())),
            journal.add_transaction(entry, Transaction::new(fuel, Amount::parse("$30.00").unwrap())),
            journal.add_transaction(entry, Transaction::new(cash, Amount::parse("$-37.00").unwrap())),
        ];
        (journal, ids)
    }

    #[test]
    fn test_sum_accounts_rolls_up_children() {
        let (mut journal, _) = sample();
        let mut state = ReportState::new();
        state.sum_accounts(&journal).unwrap();

        let expenses = journal.find_account("Expenses", false).unwrap();
        let xdata = state.account(expenses).unwrap();
        assert!(xdata.value.is_null());
        assert_eq!(xdata.total, Value::Amount(Amount::parse("$37.00").unwrap()));
        assert_eq!(xdata.count, 0);
        assert_eq!(xdata.total_count, 2);

        let root = state.account(journal.root()).unwrap();
        assert_eq!(root.total_count, 3);
        assert_eq!(root.total.sign(), Some(0));
    }

    #[test]
    fn test_running_totals() {
        let (journal, ids) = sample();
        let mut state = ReportState::new();
        state.accumulate_totals(&journal, ids.iter().copied()).unwrap();
        assert_eq!(state.xact(ids[1]).unwrap().total, Value::Amount(Amount::parse("$37.00").unwrap()));
        assert_eq!(state.xact(ids[2]).unwrap().index, 2);
    }

    #[test]
    fn test_display_flags() {
        let (journal, ids) = sample();
        let mut state = ReportState::new();
        state.mark_xact(ids[0], XactDisplay::TO_DISPLAY);
        assert!(state.xact_has_flags(ids[0], XactDisplay::TO_DISPLAY));
        assert!(!state.xact_has_flags(ids[1], XactDisplay::TO_DISPLAY));

        state.mark_account(journal.root(), AccountDisplay::DISPLAYED);
        state.clear_display_flags();
        assert!(!state.account_has_flags(journal.root(), AccountDisplay::DISPLAYED));
        state.unmark_xact(ids[0], XactDisplay::TO_DISPLAY);
        assert!(!state.xact_has_flags(ids[0], XactDisplay::TO_DISPLAY));
    }
}
