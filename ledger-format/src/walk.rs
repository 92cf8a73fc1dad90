//! Handler chain driving report output
//!
//! Walkers feed records, one at a time, into an [`ItemHandler`]. Handlers
//! see the report state mutably so they can mark what they have written.
//! Walkers never flush; the caller flushes once the last walk is done.

use crate::error::ReportResult;
use crate::journal::{AccountId, EntryId, Journal, XactId};
use crate::xdata::ReportState;

/// A consumer of report records
pub trait ItemHandler<T> {
    /// Process one record
    fn handle(&mut self, state: &mut ReportState, item: T) -> ReportResult<()>;

    /// Emit anything still buffered
    fn flush(&mut self, _state: &mut ReportState) -> ReportResult<()> {
        Ok(())
    }
}

/// Feed transactions to a handler in the given order
pub fn walk_transactions<H, I>(state: &mut ReportState, xacts: I, handler: &mut H) -> ReportResult<()>
where
    H: ItemHandler<XactId> + ?Sized,
    I: IntoIterator<Item = XactId>,
{
    for xact in xacts {
        handler.handle(state, xact)?;
    }
    Ok(())
}

/// Feed every entry of the journal to a handler in journal order
pub fn walk_entries<H>(journal: &Journal, state: &mut ReportState, handler: &mut H) -> ReportResult<()>
where
    H: ItemHandler<EntryId> + ?Sized,
{
    for entry in journal.entries() {
        handler.handle(state, entry.id)?;
    }
    Ok(())
}

/// Feed accounts to a handler in preorder, starting with the root
pub fn walk_accounts<H>(journal: &Journal, state: &mut ReportState, handler: &mut H) -> ReportResult<()>
where
    H: ItemHandler<AccountId> + ?Sized,
{
    let mut stack = vec![journal.root()];
    while let Some(id) = stack.pop() {
        handler.handle(state, id)?;
        stack.extend(journal.account(id).children.values().rev().copied());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect(Vec<AccountId>);

    impl ItemHandler<AccountId> for Collect {
        fn handle(&mut self, _state: &mut ReportState, item: AccountId) -> ReportResult<()> {
            self.0.push(item);
            Ok(())
        }
    }

    #[test]
    fn test_walk_accounts_preorder() {
        let mut journal = Journal::new();
        let food = journal.find_account("Expenses:Food", true).unwrap();
        let cash = journal.find_account("Assets:Cash", true).unwrap();
        let assets = journal.find_account("Assets", false).unwrap();
        let expenses = journal.find_account("Expenses", false).unwrap();

        let mut state = ReportState::new();
        let mut collect = Collect::default();
        walk_accounts(&journal, &mut state, &mut collect).unwrap();
        assert_eq!(collect.0, vec![journal.root(), assets, cash, expenses, food]);
    }
}
