//! Record groupers
//!
//! Groupers are [`ItemHandler`]s that render the records fed to them by a
//! walk. They remember what they rendered last so that related records can
//! share a first line, and they mark everything they write as displayed in
//! the report state.
//!
//! Templates given to the transaction, entry and equity groupers may hold a
//! `%/` marker: text before it is the first-line format, text after it the
//! format for following lines. Without a marker both are the whole template.

use std::fmt;

use chrono::{Local, NaiveDate};
use log::debug;

use super::display::AccountDisplaySelector;
use super::element::Format;
use super::render::Renderer;
use crate::config::FormatConfig;
use crate::details::Details;
use crate::error::ReportResult;
use crate::expr::{ItemPredicate, Value};
use crate::journal::{Account, AccountId, Entry, EntryId, Journal, XactId};
use crate::walk::ItemHandler;
use crate::xdata::{AccountDisplay, ReportState, XactDisplay};

const LINE_BREAK: &str = "%/";

/// Account the equity report balances against
pub const EQUITY_ACCOUNT: &str = "Equity:Opening Balances";

/// Compile the first-line and next-lines formats of a template
pub fn split_format(template: &str) -> ReportResult<(Format, Format)> {
    match template.find(LINE_BREAK) {
        Some(at) => Ok((
            Format::parse(&template[..at])?,
            Format::parse(&template[at + LINE_BREAK.len()..])?,
        )),
        None => {
            let format = Format::parse(template)?;
            Ok((format.clone(), format))
        }
    }
}

fn parse_predicate(text: &str) -> ReportResult<Option<ItemPredicate>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(ItemPredicate::parse(text)?))
}

/// Renders transactions, starting a new first line whenever the entry or
/// the date changes
pub struct FormatTransactions<'j, W> {
    out: W,
    journal: &'j Journal,
    renderer: Renderer,
    first_line: Format,
    next_lines: Format,
    last_entry: Option<EntryId>,
    last_date: Option<NaiveDate>,
}

impl<'j, W: fmt::Write> FormatTransactions<'j, W> {
    /// Create the grouper; the template is compiled immediately
    pub fn new(out: W, journal: &'j Journal, template: &str, config: FormatConfig) -> ReportResult<Self> {
        let (first_line, next_lines) = split_format(template)?;
        Ok(Self {
            out,
            journal,
            renderer: Renderer::new(config)?,
            first_line,
            next_lines,
            last_entry: None,
            last_date: None,
        })
    }

    /// Recover the output sink
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: fmt::Write> ItemHandler<XactId> for FormatTransactions<'_, W> {
    fn handle(&mut self, state: &mut ReportState, id: XactId) -> ReportResult<()> {
        if state.xact_has_flags(id, XactDisplay::DISPLAYED) {
            return Ok(());
        }

        let xact = self.journal.xact(id);
        let date = xact.actual_date(self.journal.entry(xact.entry));
        let starts_group = self.last_entry != Some(xact.entry) || self.last_date != Some(date);

        let format = if starts_group { &self.first_line } else { &self.next_lines };
        let details = Details::for_xact(self.journal, state, xact);
        self.renderer.render(format, &details, &mut self.out)?;

        state.mark_xact(id, XactDisplay::DISPLAYED);
        self.last_entry = Some(xact.entry);
        self.last_date = Some(date);
        Ok(())
    }
}

/// Buffers transactions per entry and renders each entry as a block
pub struct FormatEntries<'j, W> {
    out: W,
    journal: &'j Journal,
    renderer: Renderer,
    first_line: Format,
    next_lines: Format,
    last_entry: Option<EntryId>,
}

impl<'j, W: fmt::Write> FormatEntries<'j, W> {
    /// Create the grouper; the template is compiled immediately
    pub fn new(out: W, journal: &'j Journal, template: &str, config: FormatConfig) -> ReportResult<Self> {
        let (first_line, next_lines) = split_format(template)?;
        Ok(Self {
            out,
            journal,
            renderer: Renderer::new(config)?,
            first_line,
            next_lines,
            last_entry: None,
        })
    }

    /// Recover the output sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn format_last_entry(&mut self, state: &mut ReportState, entry: EntryId) -> ReportResult<()> {
        let pending: Vec<XactId> = self
            .journal
            .entry(entry)
            .transactions
            .iter()
            .copied()
            .filter(|id| state.xact_has_flags(*id, XactDisplay::TO_DISPLAY))
            .collect();
        debug!("Rendering entry {:?} with {} transactions", entry, pending.len());

        for (i, &id) in pending.iter().enumerate() {
            let format = if i == 0 { &self.first_line } else { &self.next_lines };
            let details = Details::for_xact(self.journal, state, self.journal.xact(id));
            self.renderer.render(format, &details, &mut self.out)?;
            state.mark_xact(id, XactDisplay::DISPLAYED);
        }
        // Rendered transactions leave the buffer so a later visit of the
        // same entry only renders what arrived since
        for id in pending {
            state.unmark_xact(id, XactDisplay::TO_DISPLAY);
        }
        Ok(())
    }
}

impl<W: fmt::Write> ItemHandler<XactId> for FormatEntries<'_, W> {
    fn handle(&mut self, state: &mut ReportState, id: XactId) -> ReportResult<()> {
        state.mark_xact(id, XactDisplay::TO_DISPLAY);

        let entry = self.journal.xact(id).entry;
        if let Some(last) = self.last_entry.filter(|last| *last != entry) {
            self.format_last_entry(state, last)?;
        }
        self.last_entry = Some(entry);
        Ok(())
    }

    fn flush(&mut self, state: &mut ReportState) -> ReportResult<()> {
        if let Some(last) = self.last_entry.take() {
            self.format_last_entry(state, last)?;
        }
        Ok(())
    }
}

/// Whole entries are buffered transaction by transaction
impl<W: fmt::Write> ItemHandler<EntryId> for FormatEntries<'_, W> {
    fn handle(&mut self, state: &mut ReportState, id: EntryId) -> ReportResult<()> {
        let journal = self.journal;
        for &xact in &journal.entry(id).transactions {
            ItemHandler::<XactId>::handle(self, state, xact)?;
        }
        Ok(())
    }

    fn flush(&mut self, state: &mut ReportState) -> ReportResult<()> {
        ItemHandler::<XactId>::flush(self, state)
    }
}

/// Renders every account the display selector approves
pub struct FormatAccounts<'j, W> {
    out: W,
    journal: &'j Journal,
    renderer: Renderer,
    format: Format,
    predicate: Option<ItemPredicate>,
}

impl<'j, W: fmt::Write> FormatAccounts<'j, W> {
    /// Create the grouper; an empty predicate accepts every account
    pub fn new(
        out: W,
        journal: &'j Journal,
        template: &str,
        predicate: &str,
        config: FormatConfig,
    ) -> ReportResult<Self> {
        Ok(Self {
            out,
            journal,
            renderer: Renderer::new(config)?,
            format: Format::parse(template)?,
            predicate: parse_predicate(predicate)?,
        })
    }

    /// Recover the output sink
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: fmt::Write> ItemHandler<AccountId> for FormatAccounts<'_, W> {
    fn handle(&mut self, state: &mut ReportState, id: AccountId) -> ReportResult<()> {
        let selector =
            AccountDisplaySelector::new(self.journal, self.renderer.total_expr(), self.predicate.as_ref());
        if !selector.display_account(state, id)? {
            return Ok(());
        }

        let account = self.journal.account(id);
        if account.is_root() {
            state.mark_account(id, AccountDisplay::TO_DISPLAY);
        } else {
            let details = Details::for_account(self.journal, state, account);
            self.renderer.render(&self.format, &details, &mut self.out)?;
            state.mark_account(id, AccountDisplay::DISPLAYED);
        }
        Ok(())
    }
}

/// Renders an opening-balances entry from account values
///
/// A header line for an "Opening Balances" entry dated today is written on
/// construction. Each approved account contributes one line per commodity
/// it holds; the flush writes the balancing lines against
/// [`EQUITY_ACCOUNT`].
pub struct FormatEquity<'j, W> {
    out: W,
    journal: &'j Journal,
    renderer: Renderer,
    next_lines: Format,
    predicate: Option<ItemPredicate>,
    total: Value,
}

impl<'j, W: fmt::Write> FormatEquity<'j, W> {
    /// Create the grouper and write the header line
    pub fn new(
        out: W,
        journal: &'j Journal,
        template: &str,
        predicate: &str,
        config: FormatConfig,
    ) -> ReportResult<Self> {
        let (first_line, next_lines) = split_format(template)?;
        let mut grouper = Self {
            out,
            journal,
            renderer: Renderer::new(config)?,
            next_lines,
            predicate: parse_predicate(predicate)?,
            total: Value::Null,
        };

        let header = Entry::new(Local::now().date_naive(), "Opening Balances");
        let scratch = ReportState::new();
        let details = Details::for_entry(journal, &scratch, &header);
        grouper.renderer.render(&first_line, &details, &mut grouper.out)?;
        Ok(grouper)
    }

    /// Recover the output sink
    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_lines(&mut self, state: &ReportState, account: &Account, value: &Value) -> ReportResult<()> {
        match value.components() {
            Some(amounts) => {
                for amount in amounts {
                    let line_value = Value::Amount(amount);
                    let details =
                        Details::for_account(self.journal, state, account).with_value(&line_value);
                    self.renderer.render(&self.next_lines, &details, &mut self.out)?;
                }
            }
            None => {
                let details = Details::for_account(self.journal, state, account).with_value(value);
                self.renderer.render(&self.next_lines, &details, &mut self.out)?;
            }
        }
        Ok(())
    }
}

impl<W: fmt::Write> ItemHandler<AccountId> for FormatEquity<'_, W> {
    fn handle(&mut self, state: &mut ReportState, id: AccountId) -> ReportResult<()> {
        let selector =
            AccountDisplaySelector::new(self.journal, self.renderer.total_expr(), self.predicate.as_ref());
        if !selector.display_account(state, id)? {
            return Ok(());
        }

        let value = state.account(id).map(|x| x.value.clone()).unwrap_or_default();
        if !value.is_null() {
            let journal = self.journal;
            self.render_lines(state, journal.account(id), &value)?;
            self.total.add_assign(&value)?;
        }
        state.mark_account(id, AccountDisplay::DISPLAYED);
        Ok(())
    }

    fn flush(&mut self, state: &mut ReportState) -> ReportResult<()> {
        let balancing = self.total.negated()?;
        let summary = Account::detached(EQUITY_ACCOUNT);
        debug!("Equity balances against {}", balancing);
        self.render_lines(state, &summary, &balancing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Transaction;
    use crate::walk::{walk_accounts, walk_entries, walk_transactions};
    use ledger_math::Amount;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn journal() -> (Journal, Vec<XactId>) {
        let mut journal = Journal::new();
        let food = journal.find_account("Expenses:Food", true).unwrap();
        let cash = journal.find_account("Assets:Cash", true).unwrap();
        let mut ids = Vec::new();

        let first = journal.add_entry(Entry::new(date(2024, 6, 1), "Bakery"));
        ids.push(journal.add_transaction(first, Transaction::new(food, Amount::parse("$4.00").unwrap())));
        ids.push(journal.add_transaction(first, Transaction::new(cash, Amount::parse("$-4.00").unwrap())));

        let second = journal.add_entry(Entry::new(date(2024, 6, 2), "Grocer"));
        ids.push(journal.add_transaction(second, Transaction::new(food, Amount::parse("$9.00").unwrap())));
        ids.push(journal.add_transaction(
            second,
            Transaction::new(cash, Amount::parse("$-9.00").unwrap()).with_date(date(2024, 6, 3)),
        ));
        (journal, ids)
    }

    #[test]
    fn test_split_format() {
        let (first, next) = split_format("%P\n%/  %A\n").unwrap();
        assert_eq!(first.source(), "%P\n");
        assert_eq!(next.source(), "  %A\n");
        let (first, next) = split_format("%A").unwrap();
        assert_eq!(first, next);
    }

    #[test]
    fn test_transactions_start_new_group_on_entry_or_date_change() {
        let (journal, ids) = journal();
        let mut state = ReportState::new();
        let mut grouper =
            FormatTransactions::new(String::new(), &journal, "F %a\n%/C %a\n", FormatConfig::default()).unwrap();
        walk_transactions(&mut state, ids.iter().copied(), &mut grouper).unwrap();
        assert_eq!(grouper.into_inner(), "F Expenses:Food\nC Assets:Cash\nF Expenses:Food\nF Assets:Cash\n");
        assert!(ids.iter().all(|id| state.xact_has_flags(*id, XactDisplay::DISPLAYED)));
    }

    #[test]
    fn test_transactions_skip_displayed() {
        let (journal, ids) = journal();
        let mut state = ReportState::new();
        state.mark_xact(ids[0], XactDisplay::DISPLAYED);
        let mut grouper =
            FormatTransactions::new(String::new(), &journal, "%P %a\n", FormatConfig::default()).unwrap();
        walk_transactions(&mut state, ids[..2].iter().copied(), &mut grouper).unwrap();
        assert_eq!(grouper.into_inner(), "Bakery Assets:Cash\n");
    }

    #[test]
    fn test_entries_render_on_entry_change_and_flush() {
        let (journal, ids) = journal();
        let mut state = ReportState::new();
        let mut grouper =
            FormatEntries::new(String::new(), &journal, "%P\n%/  %a\n", FormatConfig::default()).unwrap();

        walk_transactions(&mut state, ids[..3].iter().copied(), &mut grouper).unwrap();
        assert!(state.xact_has_flags(ids[1], XactDisplay::DISPLAYED));
        assert!(!state.xact_has_flags(ids[2], XactDisplay::DISPLAYED));

        ItemHandler::<XactId>::flush(&mut grouper, &mut state).unwrap();
        assert_eq!(grouper.into_inner(), "Bakery\n  Assets:Cash\nGrocer\n");
    }

    #[test]
    fn test_entries_revisited_render_only_new_transactions() {
        let (journal, ids) = journal();
        let mut state = ReportState::new();
        let mut grouper =
            FormatEntries::new(String::new(), &journal, "%P %a\n%/  %a\n", FormatConfig::default()).unwrap();

        // Bakery, Grocer, then Bakery again
        walk_transactions(&mut state, [ids[0], ids[2], ids[1]], &mut grouper).unwrap();
        ItemHandler::<XactId>::flush(&mut grouper, &mut state).unwrap();

        assert_eq!(
            grouper.into_inner(),
            "Bakery Expenses:Food\nGrocer Expenses:Food\nBakery Assets:Cash\n"
        );
        for id in &ids[..3] {
            assert!(state.xact_has_flags(*id, XactDisplay::DISPLAYED));
            assert!(!state.xact_has_flags(*id, XactDisplay::TO_DISPLAY));
        }
    }

    #[test]
    fn test_entries_from_entry_walk() {
        let (journal, _) = journal();
        let mut state = ReportState::new();
        let mut grouper =
            FormatEntries::new(String::new(), &journal, "%P\n%/  %a\n", FormatConfig::default()).unwrap();

        walk_entries(&journal, &mut state, &mut grouper).unwrap();
        ItemHandler::<EntryId>::flush(&mut grouper, &mut state).unwrap();
        assert_eq!(grouper.into_inner(), "Bakery\n  Assets:Cash\nGrocer\n  Assets:Cash\n");
    }

    #[test]
    fn test_accounts_skip_root_and_collapse_chains() {
        let (journal, _) = journal();
        let mut state = ReportState::new();
        state.sum_accounts(&journal).unwrap();
        let mut grouper =
            FormatAccounts::new(String::new(), &journal, "%12T  %A\n", "", FormatConfig::default()).unwrap();
        walk_accounts(&journal, &mut state, &mut grouper).unwrap();

        assert_eq!(grouper.into_inner(), "     $-13.00  Assets:Cash\n      $13.00  Expenses:Food\n");
        assert!(state.account_has_flags(journal.root(), AccountDisplay::TO_DISPLAY));
        assert!(!state.account_has_flags(journal.root(), AccountDisplay::DISPLAYED));
    }
}
