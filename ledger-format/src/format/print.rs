//! Journal-style entry printing

use std::fmt;

use super::group::FormatEntries;
use crate::config::FormatConfig;
use crate::error::ReportResult;
use crate::journal::{EntryId, EntryKind, Journal};
use crate::walk::ItemHandler;
use crate::xdata::ReportState;

/// Print an entry in journal syntax
///
/// Plain entries get a dated header line. Automated entries are introduced
/// by `= predicate` and periodic ones by `~ period`; those two header lines
/// are written without `prefix`, every other line starts with it. Display flags live in a
/// private report state, so printing never disturbs a running report.
pub fn print_entry<W: fmt::Write>(
    out: &mut W,
    journal: &Journal,
    entry: EntryId,
    prefix: &str,
    config: &FormatConfig,
) -> ReportResult<()> {
    let posting = format!("{prefix}    %-34A  %12o\n");
    let record = journal.entry(entry);

    let template = match &record.kind {
        EntryKind::Plain => format!("{prefix}%D %X%C%P\n{posting}%/{posting}"),
        EntryKind::Auto { predicate } => {
            writeln!(out, "= {predicate}")?;
            posting
        }
        EntryKind::Period { period } => {
            writeln!(out, "~ {period}")?;
            posting
        }
    };

    let mut state = ReportState::new();
    let mut formatter = FormatEntries::new(&mut *out, journal, &template, config.clone())?;
    ItemHandler::<EntryId>::handle(&mut formatter, &mut state, entry)?;
    ItemHandler::<EntryId>::flush(&mut formatter, &mut state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::{Entry, Transaction, TransactionState};
    use chrono::NaiveDate;
    use ledger_math::Amount;

    #[test]
    fn test_print_plain_entry() {
        let mut journal = Journal::new();
        let food = journal.find_account("Expenses:Food", true).unwrap();
        let cash = journal.find_account("Assets:Cash", true).unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let entry = journal.add_entry(Entry::new(date, "Market").with_code("42"));
        journal.add_transaction(
            entry,
            Transaction::new(food, Amount::parse("$7.25").unwrap()).with_state(TransactionState::Cleared),
        );
        journal.add_transaction(
            entry,
            Transaction::new(cash, Amount::parse("$-7.25").unwrap()).with_state(TransactionState::Cleared),
        );

        let mut out = String::new();
        print_entry(&mut out, &journal, entry, "", &FormatConfig::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "2024/03/09 * (42) Market");
        assert_eq!(lines[1], format!("    {:<34}  {:>12}", "Expenses:Food", "$7.25"));
        // The balancing posting of a two-line entry omits its amount
        assert_eq!(lines[2], format!("    {:<34}  {:>12}", "Assets:Cash", ""));
    }

    #[test]
    fn test_print_auto_entry_with_prefix() {
        let mut journal = Journal::new();
        let charity = journal.find_account("Expenses:Charity", true).unwrap();
        let entry = journal.add_entry(Entry::auto("/Income/"));
        journal.add_transaction(entry, Transaction::new(charity, Amount::parse("$1.00").unwrap()));

        let mut out = String::new();
        print_entry(&mut out, &journal, entry, "; ", &FormatConfig::default()).unwrap();
        // Only posting lines carry the prefix
        assert_eq!(out, format!("= /Income/\n;     {:<34}  {:>12}\n", "Expenses:Charity", "$1.00"));
    }

    #[test]
    fn test_print_period_entry() {
        let mut journal = Journal::new();
        let rent = journal.find_account("Expenses:Rent", true).unwrap();
        let entry = journal.add_entry(Entry::period("Monthly"));
        journal.add_transaction(entry, Transaction::new(rent, Amount::parse("$500.00").unwrap()));

        let mut out = String::new();
        print_entry(&mut out, &journal, entry, "", &FormatConfig::default()).unwrap();
        assert!(out.starts_with("~ Monthly\n"));
        assert!(out.contains("Expenses:Rent"));
    }
}
