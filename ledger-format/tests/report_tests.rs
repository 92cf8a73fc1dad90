//! Integration tests for ledger-format

use chrono::NaiveDate;
use ledger_format::error::FormatError;
use ledger_format::format::{ElementFlags, ElementKind};
use ledger_format::{
    walk_accounts, walk_transactions, AccountId, Amount, Details, Entry, Format, FormatAccounts,
    FormatConfig, FormatEquity, FormatTransactions, ItemHandler, Journal, Renderer, ReportError, ReportState,
    Transaction, XactId,
};

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

fn amount(text: &str) -> Amount {
    Amount::parse(text).unwrap()
}

fn post(journal: &mut Journal, day: u32, payee: &str, postings: &[(&str, &str)]) {
    let entry = journal.add_entry(Entry::new(date(day), payee));
    for (account, value) in postings {
        let id = journal.find_account(account, true).unwrap();
        journal.add_transaction(entry, Transaction::new(id, amount(value)));
    }
}

fn household() -> Journal {
    let mut journal = Journal::new();
    post(&mut journal, 1, "Payday", &[("Assets:Bank", "$100.00"), ("Income:Salary", "$-100.00")]);
    post(&mut journal, 3, "Market", &[("Expenses:Food", "$30.00"), ("Assets:Bank", "$-30.00")]);
    post(&mut journal, 5, "ATM", &[("Assets:Cash", "$20.00"), ("Assets:Bank", "$-20.00")]);
    journal
}

fn balance_report(journal: &Journal, state: &mut ReportState) -> String {
    let mut report =
        FormatAccounts::new(String::new(), journal, "%12T  %2_%a\n", "", FormatConfig::default()).unwrap();
    walk_accounts(journal, state, &mut report).unwrap();
    report.into_inner()
}

#[test]
fn test_balance_report() {
    let journal = household();
    let mut state = ReportState::new();
    state.sum_accounts(&journal).unwrap();

    let expected = [
        "      $70.00  Assets",
        "      $50.00    Bank",
        "      $20.00    Cash",
        "      $30.00  Expenses:Food",
        "    $-100.00  Income:Salary",
    ];
    assert_eq!(balance_report(&journal, &mut state), format!("{}\n", expected.join("\n")));
}

#[test]
fn test_second_pass_needs_cleared_flags() {
    let journal = household();
    let mut state = ReportState::new();
    state.sum_accounts(&journal).unwrap();

    let first = balance_report(&journal, &mut state);
    assert_eq!(balance_report(&journal, &mut state), "");

    state.clear_display_flags();
    assert_eq!(balance_report(&journal, &mut state), first);
}

#[test]
fn test_register_report() {
    let journal = household();
    let bank = journal.find_account_id("Assets:Bank");
    let xacts: Vec<XactId> = journal
        .entries()
        .flat_map(|entry| entry.transactions.iter().copied())
        .filter(|id| journal.xact(*id).account == bank)
        .collect();

    let mut state = ReportState::new();
    state.accumulate_totals(&journal, xacts.iter().copied()).unwrap();
    let mut report =
        FormatTransactions::new(String::new(), &journal, "%-8P %-12A %9t %9T\n", FormatConfig::default())
            .unwrap();
    walk_transactions(&mut state, xacts, &mut report).unwrap();

    let line = |payee: &str, amt: &str, total: &str| {
        format!("{:<8} {:<12} {:>9} {:>9}\n", payee, "Assets:Bank", amt, total)
    };
    let expected = [
        line("Payday", "$100.00", "$100.00"),
        line("Market", "$-30.00", "$70.00"),
        line("ATM", "$-20.00", "$50.00"),
    ]
    .concat();
    assert_eq!(report.into_inner(), expected);
}

#[test]
fn test_transaction_grouping_by_entry_and_date() {
    let mut journal = Journal::new();
    let food = journal.find_account("Expenses:Food", true).unwrap();
    let cash = journal.find_account("Assets:Cash", true).unwrap();
    let entry = journal.add_entry(Entry::new(date(8), "Deli"));
    let ids = [
        journal.add_transaction(entry, Transaction::new(food, amount("$6.00"))),
        journal.add_transaction(entry, Transaction::new(cash, amount("$-4.00"))),
        journal.add_transaction(entry, Transaction::new(cash, amount("$-2.00")).with_date(date(9))),
    ];

    let mut state = ReportState::new();
    let mut report =
        FormatTransactions::new(String::new(), &journal, "%D %A\n%/           %A\n", FormatConfig::default())
            .unwrap();
    walk_transactions(&mut state, ids, &mut report).unwrap();

    assert_eq!(
        report.into_inner(),
        "2024/01/08 Expenses:Food\n           Assets:Cash\n2024/01/09 Assets:Cash\n"
    );
}

#[test]
fn test_equity_report() {
    let mut journal = Journal::new();
    post(
        &mut journal,
        1,
        "Setup",
        &[
            ("Assets:Bank", "$50.00"),
            ("Assets:Cash", "10 EUR"),
            ("Equity:Capital", "$-50.00"),
            ("Equity:Capital", "-10 EUR"),
        ],
    );
    let mut state = ReportState::new();
    state.sum_accounts(&journal).unwrap();

    let mut report =
        FormatEquity::new(String::new(), &journal, "%P\n%/    %-24A%12t\n", "/^Assets/", FormatConfig::default())
            .unwrap();
    walk_accounts(&journal, &mut state, &mut report).unwrap();
    report.flush(&mut state).unwrap();

    let line = |account: &str, value: String| format!("    {:<24}{:>12}\n", account, value);
    let expected = [
        "Opening Balances\n".to_string(),
        line("Assets:Bank", "$50.00".to_string()),
        line("Assets:Cash", amount("10 EUR").to_string()),
        line("Equity:Opening Balances", "$-50.00".to_string()),
        line("Equity:Opening Balances", amount("10 EUR").negated().to_string()),
    ]
    .concat();
    assert_eq!(report.into_inner(), expected);

    let capital = journal.find_account_id("Equity:Capital");
    assert!(!state.account_has_flags(capital, ledger_format::AccountDisplay::DISPLAYED));
}

#[test]
fn test_template_compilation() {
    let first = Format::parse("%-10.8A").unwrap();
    let again = Format::parse("%-10.8A").unwrap();
    assert_eq!(first, again);

    let element = &first.elements()[0];
    assert_eq!(element.kind, ElementKind::AccountFullname);
    assert_eq!((element.min_width, element.max_width), (10, 8));
    assert!(element.has_flags(ElementFlags::ALIGN_LEFT));

    let binding = Format::parse("%.10A").unwrap();
    let element = &binding.elements()[0];
    assert_eq!(element.min_width, 10);

    assert_eq!(Format::parse("%(unterminated"), Err(FormatError::MissingDelimiter(')')));
}

#[test]
fn test_bad_total_expression_fails_fast() {
    let journal = Journal::new();
    let config = FormatConfig { total_expr: "total +".to_string(), ..FormatConfig::default() };
    let result = FormatAccounts::new(String::new(), &journal, "%T\n", "", config);
    assert!(matches!(result, Err(ReportError::Expr(_))));
}

#[test]
fn test_config_fixture() {
    let config: FormatConfig = serde_json::from_str(include_str!("fixtures/format_config.json")).unwrap();
    assert_eq!(config.abbrev_length, 3);
    assert!(config.ansi_codes);
    assert_eq!(config.total_expr, "total");

    let mut journal = Journal::new();
    let entry = journal.add_entry(Entry::new(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap(), "Supermarket Deluxe"));
    let state = ReportState::new();
    let renderer = Renderer::new(config).unwrap();
    let format = Format::parse("%D %-10.10P|").unwrap();
    let details = Details::for_entry(&journal, &state, journal.entry(entry));
    assert_eq!(renderer.render_to_string(&format, &details).unwrap(), "05-Feb Supermar..|");
}

trait FindAccount {
    fn find_account_id(&self, path: &str) -> AccountId;
}

impl FindAccount for Journal {
    fn find_account_id(&self, path: &str) -> AccountId {
        self.accounts()
            .find(|account| self.fullname(account) == path)
            .map(|account| account.id)
            .unwrap()
    }
}
