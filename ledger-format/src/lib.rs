//! Report formatting for Ledger journals
//!
//! This crate turns journal records into text. Templates such as
//! `"%-20A  %12T\n"` are compiled into element lists, rendered against the
//! entry, transaction or account at hand, and grouped into register,
//! balance, equity and print style output.
//!
//! Report state (display flags and aggregated values) is owned by the
//! caller and passed explicitly to every grouper, so the journal itself is
//! never mutated by a report.

#![warn(clippy::all)]
#![warn(missing_docs)]

/// Module for formatting options
pub mod config;

/// Module for the record view handed to renderers and expressions
pub mod details;

/// Module for error types
pub mod error;

/// Module for value expression parsing and evaluation
pub mod expr;

/// Module for template compilation, rendering and grouping
pub mod format;

/// Module for the journal arena
pub mod journal;

/// Module for report walkers and handler chains
pub mod walk;

/// Module for per-report account and transaction data
pub mod xdata;

// Re-export main types
pub use config::{ElisionStyle, FormatConfig};
pub use details::Details;
pub use error::{ConfigError, FormatError, ReportError, ReportResult, MAX_WIDTH};
pub use expr::{ExprError, ItemPredicate, Value, ValueExpr};
pub use format::{
    print_entry, AccountDisplaySelector, Format, FormatAccounts, FormatEntries, FormatEquity,
    FormatTransactions, Renderer, Truncator,
};
pub use journal::{Account, AccountId, Entry, EntryId, EntryKind, Journal, Transaction, XactId};
pub use walk::{walk_accounts, walk_entries, walk_transactions, ItemHandler};
pub use xdata::{AccountDisplay, ReportState, XactDisplay};

// Re-export for convenience
pub use ledger_math::{Amount, Balance};
