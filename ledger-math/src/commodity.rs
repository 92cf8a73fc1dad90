//! Commodity module providing currency and commodity type support
//!
//! A commodity is identified by its symbol alone. Display style (prefix or
//! suffix placement, separating space) and precision travel with it so that
//! an amount prints the way it was first written.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use bitflags::bitflags;

/// Precision type for commodity display settings
pub type Precision = u16;

/// Reference-counted commodity for safe sharing
pub type CommodityRef = Arc<Commodity>;

bitflags! {
    /// Commodity display style flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CommodityFlags: u8 {
        /// Symbol follows the quantity (`10 EUR`)
        const STYLE_SUFFIXED = 0x01;
        /// Symbol and quantity are separated by a space (`EUR 10`)
        const STYLE_SEPARATED = 0x02;
    }
}

/// Represents a commodity (currency or other tradeable item)
#[derive(Debug, Clone)]
pub struct Commodity {
    symbol: String,
    precision: Precision,
    flags: CommodityFlags,
}

impl Commodity {
    /// Create a prefixed, unseparated commodity with no decimal places
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into(), precision: 0, flags: CommodityFlags::empty() }
    }

    /// Create a commodity with an explicit display precision
    pub fn with_precision(symbol: impl Into<String>, precision: Precision) -> Self {
        Self { precision, ..Self::new(symbol) }
    }

    /// Builder-style flag setter
    pub fn with_flags(mut self, flags: CommodityFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Get the symbol of this commodity
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get the display precision of this commodity
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Get the style flags of this commodity
    pub fn flags(&self) -> CommodityFlags {
        self.flags
    }

    /// Check if this commodity has specific flags set
    pub fn has_flags(&self, flags: CommodityFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Write `quantity` decorated with this commodity's symbol and style
    pub fn decorate(&self, quantity: &str) -> String {
        let sep = if self.has_flags(CommodityFlags::STYLE_SEPARATED) { " " } else { "" };
        if self.has_flags(CommodityFlags::STYLE_SUFFIXED) {
            format!("{quantity}{sep}{}", self.symbol)
        } else {
            format!("{}{sep}{quantity}", self.symbol)
        }
    }
}

impl PartialEq for Commodity {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Commodity {}

impl Hash for Commodity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl PartialOrd for Commodity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Commodity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.symbol.cmp(&other.symbol)
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_symbol_only() {
        let a = Commodity::with_precision("$", 2);
        let b = Commodity::new("$").with_flags(CommodityFlags::STYLE_SEPARATED);
        assert_eq!(a, b);
        assert_ne!(a, Commodity::new("EUR"));
    }

    #[test]
    fn test_decorate_styles() {
        assert_eq!(Commodity::new("$").decorate("10.00"), "$10.00");
        let eur = Commodity::new("EUR")
            .with_flags(CommodityFlags::STYLE_SUFFIXED | CommodityFlags::STYLE_SEPARATED);
        assert_eq!(eur.decorate("10"), "10 EUR");
        let usd = Commodity::new("USD").with_flags(CommodityFlags::STYLE_SEPARATED);
        assert_eq!(usd.decorate("5"), "USD 5");
    }
}
