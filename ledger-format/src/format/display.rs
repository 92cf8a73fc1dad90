//! Account display selection
//!
//! Decides whether an account gets its own line in a balance-style report.
//! A chain of accounts with a single child carrying the same total is
//! collapsed onto that child; an account whose children diverge is shown
//! as a subtotal above them.

use log::debug;

use crate::details::Details;
use crate::error::ReportResult;
use crate::expr::{ItemPredicate, Value, ValueExpr};
use crate::journal::{AccountId, Journal};
use crate::xdata::{AccountDisplay, ReportState};

/// Chooses which accounts of a journal are displayed
#[derive(Debug, Clone, Copy)]
pub struct AccountDisplaySelector<'a> {
    journal: &'a Journal,
    total_expr: &'a ValueExpr,
    predicate: Option<&'a ItemPredicate>,
}

impl<'a> AccountDisplaySelector<'a> {
    /// Create a selector comparing accounts by `total_expr`
    pub fn new(
        journal: &'a Journal,
        total_expr: &'a ValueExpr,
        predicate: Option<&'a ItemPredicate>,
    ) -> Self {
        Self { journal, total_expr, predicate }
    }

    /// Check if an account should be displayed now
    ///
    /// Already displayed accounts never are. A parent whose passing children
    /// diverge from it, or that has more than one passing child, is always
    /// displayed. A parent with exactly one passing child of the same total
    /// is not, since the child stands in for it. Anything else is displayed
    /// when it satisfies the predicate.
    pub fn display_account(&self, state: &ReportState, account: AccountId) -> ReportResult<bool> {
        if state.account_has_flags(account, AccountDisplay::DISPLAYED) {
            return Ok(false);
        }

        let (aggregate, nominated) = self.disp_subaccounts(state, account)?;
        if aggregate {
            debug!("Account {:?} shown as a subtotal", account);
            return Ok(true);
        }
        if let Some(child) = nominated {
            debug!("Account {:?} collapsed onto child {:?}", account, child);
            return Ok(false);
        }
        self.matches(state, account)
    }

    fn disp_subaccounts(
        &self,
        state: &ReportState,
        account: AccountId,
    ) -> ReportResult<(bool, Option<AccountId>)> {
        let mut account_total: Option<Value> = None;
        let mut nominated = None;

        for &child in self.journal.account(account).children.values() {
            if !self.matches(state, child)? {
                continue;
            }

            let child_total = self.total(state, child)?;
            if account_total.is_none() {
                account_total = Some(self.total(state, account)?);
            }
            if nominated.is_some() || account_total.as_ref() != Some(&child_total) {
                return Ok((true, None));
            }
            nominated = Some(child);
        }

        Ok((false, nominated))
    }

    fn total(&self, state: &ReportState, account: AccountId) -> ReportResult<Value> {
        let details = Details::for_account(self.journal, state, self.journal.account(account));
        Ok(self.total_expr.calc(&details)?)
    }

    fn matches(&self, state: &ReportState, account: AccountId) -> ReportResult<bool> {
        match self.predicate {
            None => Ok(true),
            Some(predicate) => {
                let details = Details::for_account(self.journal, state, self.journal.account(account));
                Ok(predicate.matches(&details)?)
            }
        }
    }
}
