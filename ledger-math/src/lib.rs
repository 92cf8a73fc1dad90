//! Commodity-aware arithmetic for Ledger reports
//!
//! This crate provides the value types the report formatter works with:
//! single-commodity [`Amount`]s, multi-commodity [`Balance`]s and
//! [`BalancePair`]s that carry a cost basis next to the quantity.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod amount;
pub mod balance;
pub mod commodity;

// Re-export main types
pub use amount::{Amount, AmountError, AmountResult};
pub use balance::{Balance, BalanceError, BalancePair, BalanceResult};
pub use commodity::{Commodity, CommodityFlags, CommodityRef, Precision};

// Re-export for convenience
pub use rust_decimal::Decimal;
