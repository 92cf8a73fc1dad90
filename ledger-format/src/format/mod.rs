//! Report templates
//!
//! A template is compiled once into a [`Format`] and rendered for each
//! record by a [`Renderer`]. The groupers in [`group`] drive rendering from
//! the report walkers and decide which template applies to which record.

pub mod display;
pub mod element;
pub mod group;
pub mod print;
pub mod render;
pub mod truncate;

pub use display::AccountDisplaySelector;
pub use element::{Element, ElementFlags, ElementKind, Format};
pub use group::{
    split_format, FormatAccounts, FormatEntries, FormatEquity, FormatTransactions, EQUITY_ACCOUNT,
};
pub use print::print_entry;
pub use render::Renderer;
pub use truncate::Truncator;
