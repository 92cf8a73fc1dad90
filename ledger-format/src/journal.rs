//! Journal arena holding accounts, entries and their transactions
//!
//! Records refer to each other through copyable ids rather than shared
//! pointers. An account stores its parent id for upward navigation and owns
//! the ids of its children; an entry owns the ids of its transactions. Ids
//! handed to a journal must come from that journal: a foreign id panics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;
use compact_str::CompactString;
use ledger_math::Amount;

/// Identifies an account within a [`Journal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(usize);

/// Identifies an entry within a [`Journal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(usize);

/// Identifies a transaction within a [`Journal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct XactId(usize);

impl AccountId {
    /// Id carried by synthetic accounts that live outside any journal
    pub const DETACHED: AccountId = AccountId(usize::MAX);
}

impl EntryId {
    /// Id carried by synthetic entries that live outside any journal
    pub const DETACHED: EntryId = EntryId(usize::MAX);
}

impl XactId {
    /// Id carried by transactions not yet added to a journal
    pub const DETACHED: XactId = XactId(usize::MAX);
}

/// Clearing state of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// Not yet reconciled
    #[default]
    Uncleared,
    /// Reconciled (`*`)
    Cleared,
    /// Awaiting reconciliation (`!`)
    Pending,
}

impl TransactionState {
    /// Marker printed before a payee or account, if any
    pub fn marker(self) -> &'static str {
        match self {
            TransactionState::Cleared => "* ",
            TransactionState::Pending => "! ",
            TransactionState::Uncleared => "",
        }
    }
}

bitflags::bitflags! {
    /// Transaction flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransactionFlags: u8 {
        /// Posted to a virtual account, written `(Account)`
        const VIRTUAL = 0x01;
        /// Virtual posting that must still balance, written `[Account]`
        const BALANCE = 0x02;
    }
}

/// Byte offsets and line numbers of a record in its source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Byte offset of the first character
    pub beg_pos: u64,
    /// Line number of the first line
    pub beg_line: usize,
    /// Byte offset just past the last character
    pub end_pos: u64,
    /// Line number of the last line
    pub end_line: usize,
}

/// A node in the account tree
#[derive(Debug, Clone)]
pub struct Account {
    /// Arena id of this account
    pub id: AccountId,
    /// Name of this node only, without its parents
    pub name: CompactString,
    /// Parent account, `None` for the root and for detached accounts
    pub parent: Option<AccountId>,
    /// Child accounts, ordered by name
    pub children: BTreeMap<CompactString, AccountId>,
    /// Number of ancestors below the root
    pub depth: usize,
}

impl Account {
    /// A synthetic account that is not part of any journal
    pub fn detached(name: impl Into<CompactString>) -> Self {
        Self {
            id: AccountId::DETACHED,
            name: name.into(),
            parent: None,
            children: BTreeMap::new(),
            depth: 0,
        }
    }

    /// Check if this is the root of its tree
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Kind of entry, deciding how it is printed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EntryKind {
    /// A regular dated entry
    #[default]
    Plain,
    /// An automated entry applied to postings matching a predicate
    Auto {
        /// Predicate text as written after `=`
        predicate: String,
    },
    /// A periodic (budget) entry
    Period {
        /// Period text as written after `~`
        period: String,
    },
}

/// A dated journal entry grouping balanced transactions
#[derive(Debug, Clone)]
pub struct Entry {
    /// Arena id of this entry
    pub id: EntryId,
    /// Plain, automated or periodic
    pub kind: EntryKind,
    /// Actual date
    pub date: NaiveDate,
    /// Optional effective date
    pub effective_date: Option<NaiveDate>,
    /// Optional check number or reference
    pub code: Option<CompactString>,
    /// Payee/description
    pub payee: CompactString,
    /// Transactions in source order
    pub transactions: Vec<XactId>,
    /// Index into [`Journal::sources`]
    pub src_idx: Option<usize>,
    /// Location in the source file
    pub position: Position,
}

impl Entry {
    /// Create a plain entry with no transactions
    pub fn new(date: NaiveDate, payee: impl Into<CompactString>) -> Self {
        Self {
            id: EntryId::DETACHED,
            kind: EntryKind::Plain,
            date,
            effective_date: None,
            code: None,
            payee: payee.into(),
            transactions: Vec::new(),
            src_idx: None,
            position: Position::default(),
        }
    }

    /// Create an automated entry
    pub fn auto(predicate: impl Into<String>) -> Self {
        let mut entry = Self::new(NaiveDate::MIN, "");
        entry.kind = EntryKind::Auto { predicate: predicate.into() };
        entry
    }

    /// Create a periodic entry
    pub fn period(period: impl Into<String>) -> Self {
        let mut entry = Self::new(NaiveDate::MIN, "");
        entry.kind = EntryKind::Period { period: period.into() };
        entry
    }

    /// Builder-style code setter
    pub fn with_code(mut self, code: impl Into<CompactString>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Builder-style effective date setter
    pub fn with_effective_date(mut self, date: NaiveDate) -> Self {
        self.effective_date = Some(date);
        self
    }
}

/// One posting of an amount to an account within an entry
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Arena id of this transaction
    pub id: XactId,
    /// Owning entry
    pub entry: EntryId,
    /// Account posted to
    pub account: AccountId,
    /// Amount posted
    pub amount: Amount,
    /// Total cost paid for `amount`, when it was bought with another commodity
    pub cost: Option<Amount>,
    /// Clearing state
    pub state: TransactionState,
    /// Virtual/balance flags
    pub flags: TransactionFlags,
    /// Own date, overriding the entry's
    pub date: Option<NaiveDate>,
    /// Own effective date, overriding the entry's
    pub effective_date: Option<NaiveDate>,
    /// Trailing comment
    pub note: Option<CompactString>,
    /// Location in the source file
    pub position: Position,
}

impl Transaction {
    /// Create an uncleared transaction
    pub fn new(account: AccountId, amount: Amount) -> Self {
        Self {
            id: XactId::DETACHED,
            entry: EntryId::DETACHED,
            account,
            amount,
            cost: None,
            state: TransactionState::Uncleared,
            flags: TransactionFlags::empty(),
            date: None,
            effective_date: None,
            note: None,
            position: Position::default(),
        }
    }

    /// Builder-style cost setter
    pub fn with_cost(mut self, cost: Amount) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Builder-style state setter
    pub fn with_state(mut self, state: TransactionState) -> Self {
        self.state = state;
        self
    }

    /// Builder-style flag setter
    pub fn with_flags(mut self, flags: TransactionFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Builder-style note setter
    pub fn with_note(mut self, note: impl Into<CompactString>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builder-style date setter
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Check if specific flags are set
    pub fn has_flags(&self, flags: TransactionFlags) -> bool {
        self.flags.contains(flags)
    }

    /// The transaction's own date, or its entry's
    pub fn actual_date(&self, entry: &Entry) -> NaiveDate {
        self.date.unwrap_or(entry.date)
    }

    /// The transaction's effective date, falling back to its entry's
    pub fn effective_date(&self, entry: &Entry) -> Option<NaiveDate> {
        self.effective_date.or(entry.effective_date)
    }
}

/// Arena of accounts, entries and transactions
#[derive(Debug, Clone)]
pub struct Journal {
    accounts: Vec<Account>,
    entries: Vec<Entry>,
    xacts: Vec<Transaction>,
    /// Source file paths, indexed by [`Entry::src_idx`]
    pub sources: Vec<PathBuf>,
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}

impl Journal {
    /// Create an empty journal holding only the root account
    pub fn new() -> Self {
        let root = Account {
            id: AccountId(0),
            name: CompactString::default(),
            parent: None,
            children: BTreeMap::new(),
            depth: 0,
        };
        Self { accounts: vec![root], entries: Vec::new(), xacts: Vec::new(), sources: Vec::new() }
    }

    /// The root of the account tree
    pub fn root(&self) -> AccountId {
        AccountId(0)
    }

    /// Look up an account
    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.0]
    }

    /// Look up an entry
    pub fn entry(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    /// Look up a transaction
    pub fn xact(&self, id: XactId) -> &Transaction {
        &self.xacts[id.0]
    }

    /// All accounts in creation order, root first
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// All entries in the order they were added
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Transactions of an entry in source order
    pub fn entry_transactions<'a>(&'a self, entry: &'a Entry) -> impl Iterator<Item = &'a Transaction> {
        entry.transactions.iter().map(move |id| self.xact(*id))
    }

    /// Find an account by its colon-separated path
    ///
    /// Missing segments are created when `auto_create` is set; otherwise a
    /// missing segment yields `None`. The empty path names the root.
    pub fn find_account(&mut self, path: &str, auto_create: bool) -> Option<AccountId> {
        let mut current = self.root();
        for segment in path.split(':').filter(|s| !s.is_empty()) {
            let existing = self.accounts[current.0].children.get(segment).copied();
            current = match existing {
                Some(child) => child,
                None if auto_create => self.create_child(current, segment),
                None => return None,
            };
        }
        Some(current)
    }

    fn create_child(&mut self, parent: AccountId, name: &str) -> AccountId {
        let id = AccountId(self.accounts.len());
        let depth = self.accounts[parent.0].depth + 1;
        let name = CompactString::from(name);
        self.accounts.push(Account {
            id,
            name: name.clone(),
            parent: Some(parent),
            children: BTreeMap::new(),
            depth,
        });
        self.accounts[parent.0].children.insert(name, id);
        id
    }

    /// Full colon-separated path of an account, empty for the root
    ///
    /// Detached accounts have no parents, so their name is their path.
    pub fn fullname(&self, account: &Account) -> String {
        let mut parts = vec![account.name.as_str()];
        let mut parent = account.parent;
        while let Some(id) = parent {
            let node = self.account(id);
            if node.parent.is_some() {
                parts.push(node.name.as_str());
            }
            parent = node.parent;
        }
        parts.reverse();
        parts.join(":")
    }

    /// Register a source file and return its index
    pub fn add_source(&mut self, path: impl Into<PathBuf>) -> usize {
        self.sources.push(path.into());
        self.sources.len() - 1
    }

    /// Add an entry; its transaction list is reset and filled by
    /// [`Journal::add_transaction`]
    pub fn add_entry(&mut self, mut entry: Entry) -> EntryId {
        let id = EntryId(self.entries.len());
        entry.id = id;
        entry.transactions.clear();
        self.entries.push(entry);
        id
    }

    /// Append a transaction to an entry
    pub fn add_transaction(&mut self, entry: EntryId, mut xact: Transaction) -> XactId {
        let id = XactId(self.xacts.len());
        xact.id = id;
        xact.entry = entry;
        self.xacts.push(xact);
        self.entries[entry.0].transactions.push(id);
        id
    }

    /// The clearing state shared by every transaction of an entry
    ///
    /// `None` when the entry has no transactions or they disagree.
    pub fn entry_state(&self, entry: &Entry) -> Option<TransactionState> {
        let mut states = self.entry_transactions(entry).map(|x| x.state);
        let first = states.next()?;
        states.all(|s| s == first).then_some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_find_account_creates_path() {
        let mut journal = Journal::new();
        let checking = journal.find_account("Assets:Bank:Checking", true).unwrap();
        let account = journal.account(checking);
        assert_eq!(account.name, "Checking");
        assert_eq!(account.depth, 3);
        assert_eq!(journal.fullname(account), "Assets:Bank:Checking");

        let bank = journal.find_account("Assets:Bank", false).unwrap();
        assert_eq!(journal.account(checking).parent, Some(bank));
        assert!(journal.find_account("Assets:Cash", false).is_none());
        assert_eq!(journal.find_account("", false), Some(journal.root()));
    }

    #[test]
    fn test_children_are_name_ordered() {
        let mut journal = Journal::new();
        journal.find_account("Expenses", true);
        journal.find_account("Assets", true);
        let names: Vec<_> =
            journal.account(journal.root()).children.keys().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["Assets", "Expenses"]);
    }

    #[test]
    fn test_detached_account_fullname() {
        let journal = Journal::new();
        let summary = Account::detached("Equity:Opening Balances");
        assert_eq!(journal.fullname(&summary), "Equity:Opening Balances");
    }

    #[test]
    fn test_entry_state_requires_agreement() {
        let mut journal = Journal::new();
        let cash = journal.find_account("Assets:Cash", true).unwrap();
        let food = journal.find_account("Expenses:Food", true).unwrap();
        let entry = journal.add_entry(Entry::new(date(2024, 1, 5), "Market"));
        journal.add_transaction(
            entry,
            Transaction::new(food, Amount::parse("$5.00").unwrap())
                .with_state(TransactionState::Cleared),
        );
        let second = journal.add_transaction(
            entry,
            Transaction::new(cash, Amount::parse("$-5.00").unwrap())
                .with_state(TransactionState::Cleared),
        );
        assert_eq!(
            journal.entry_state(journal.entry(entry)),
            Some(TransactionState::Cleared)
        );

        journal.xacts[second.0].state = TransactionState::Pending;
        assert_eq!(journal.entry_state(journal.entry(entry)), None);
    }
}
