//! Amount module providing exact decimal arithmetic with commodity support
//!
//! An [`Amount`] is a `rust_decimal` quantity tagged with an optional
//! commodity. Arithmetic between amounts of different commodities is an
//! error; callers that need to mix commodities collect amounts into a
//! [`Balance`](crate::Balance).

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::commodity::{Commodity, CommodityFlags, CommodityRef, Precision};

/// Errors that can occur during amount operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// Divisor was zero
    #[error("Division by zero")]
    DivisionByZero,
    /// Result does not fit a decimal
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
    /// Operands carry different commodities
    #[error("Cannot perform operation on amounts with different commodities ({0} and {1})")]
    CommodityMismatch(String, String),
    /// Text is not an amount
    #[error("Cannot parse amount from string: {0}")]
    ParseError(String),
}

/// Result type for amount operations
pub type AmountResult<T> = Result<T, AmountError>;

/// A decimal quantity with an optional commodity
#[derive(Clone, Debug, Default)]
pub struct Amount {
    quantity: Decimal,
    commodity: Option<CommodityRef>,
    keep_precision: bool,
}

impl Amount {
    /// Create a commodity-less amount
    pub fn new(quantity: Decimal) -> Self {
        Self { quantity, commodity: None, keep_precision: false }
    }

    /// Create an amount from an integer
    pub fn from_i64(value: i64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create a new amount with a specific commodity
    pub fn with_commodity(quantity: Decimal, commodity: Option<CommodityRef>) -> Self {
        Self { quantity, commodity, keep_precision: false }
    }

    /// Parse an amount such as `$10.00`, `-5 EUR`, `USD 3` or `42`
    ///
    /// The commodity remembers where its symbol was written and how many
    /// decimal places the quantity carried.
    pub fn parse(text: &str) -> AmountResult<Self> {
        let text = text.trim();
        let mut negative = false;
        let mut rest = text;
        if let Some(stripped) = rest.strip_prefix('-') {
            negative = true;
            rest = stripped.trim_start();
        }

        let starts_numeric = rest.starts_with(|c: char| c.is_ascii_digit() || c == '.');
        let (symbol, number, flags) = if starts_numeric {
            let end = rest.find(|c: char| !is_quantity_char(c)).unwrap_or(rest.len());
            let (number, tail) = rest.split_at(end);
            let symbol = tail.trim();
            let mut flags = CommodityFlags::STYLE_SUFFIXED;
            if !symbol.is_empty() && tail.len() != tail.trim_start().len() {
                flags |= CommodityFlags::STYLE_SEPARATED;
            }
            (symbol, number, flags)
        } else {
            let end = rest
                .find(|c: char| c.is_ascii_digit() || c == '-' || c == '.' || c.is_whitespace())
                .unwrap_or(rest.len());
            let (symbol, tail) = rest.split_at(end);
            if symbol.is_empty() {
                return Err(AmountError::ParseError(text.to_string()));
            }
            let mut number = tail.trim_start();
            let flags = if number.len() != tail.len() {
                CommodityFlags::STYLE_SEPARATED
            } else {
                CommodityFlags::empty()
            };
            if let Some(stripped) = number.strip_prefix('-') {
                negative = !negative;
                number = stripped;
            }
            (symbol, number.trim_end(), flags)
        };

        if number.is_empty() || !number.chars().all(is_quantity_char) {
            return Err(AmountError::ParseError(text.to_string()));
        }

        let cleaned: String = number.chars().filter(|c| *c != ',').collect();
        let precision = cleaned.find('.').map_or(0, |dot| cleaned.len() - dot - 1);
        let mut quantity =
            Decimal::from_str(&cleaned).map_err(|_| AmountError::ParseError(text.to_string()))?;
        if negative {
            quantity = -quantity;
        }

        let commodity = if symbol.is_empty() {
            None
        } else {
            if symbol.chars().any(char::is_whitespace) {
                return Err(AmountError::ParseError(text.to_string()));
            }
            let precision = Precision::try_from(precision).unwrap_or(Precision::MAX);
            Some(Arc::new(Commodity::with_precision(symbol, precision).with_flags(flags)))
        };

        Ok(Self::with_commodity(quantity, commodity))
    }

    /// The raw decimal quantity
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Get the commodity reference
    pub fn commodity(&self) -> Option<&CommodityRef> {
        self.commodity.as_ref()
    }

    /// The commodity symbol, or the empty string for bare numbers
    pub fn symbol(&self) -> &str {
        self.commodity.as_ref().map_or("", |c| c.symbol())
    }

    /// Check if this amount has a commodity
    pub fn has_commodity(&self) -> bool {
        self.commodity.is_some()
    }

    /// Get the sign of this amount: -1, 0 or 1
    pub fn sign(&self) -> i32 {
        if self.quantity.is_zero() {
            0
        } else if self.quantity.is_sign_negative() {
            -1
        } else {
            1
        }
    }

    /// Check if this amount is exactly zero
    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Get the absolute value of this amount
    pub fn abs(&self) -> Self {
        Self { quantity: self.quantity.abs(), ..self.clone() }
    }

    /// Get the negated value of this amount
    pub fn negated(&self) -> Self {
        let mut result = self.clone();
        result.in_place_negate();
        result
    }

    /// Negate this amount in place
    pub fn in_place_negate(&mut self) {
        if !self.quantity.is_zero() {
            self.quantity = -self.quantity;
        }
    }

    /// Get a copy of this amount without commodity information
    pub fn number(&self) -> Self {
        Self::new(self.quantity)
    }

    /// A copy that prints every significant digit instead of rounding to
    /// the commodity's precision
    pub fn unrounded(&self) -> Self {
        Self { keep_precision: true, ..self.clone() }
    }

    /// Price of one unit when `self` is the total cost of `count` units
    pub fn per_unit(&self, count: &Amount) -> AmountResult<Amount> {
        if count.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        let quantity = self
            .quantity
            .checked_div(count.quantity)
            .ok_or(AmountError::ArithmeticOverflow)?;
        Ok(Self::with_commodity(quantity, self.commodity.clone()))
    }

    /// Compare two amounts of the same commodity
    pub fn compare(&self, other: &Amount) -> AmountResult<Ordering> {
        self.check_compatible(other)?;
        Ok(self.quantity.cmp(&other.quantity))
    }

    /// Add another amount of the same commodity
    pub fn checked_add(&self, other: &Amount) -> AmountResult<Amount> {
        let commodity = self.merged_commodity(other)?;
        let quantity = self
            .quantity
            .checked_add(other.quantity)
            .ok_or(AmountError::ArithmeticOverflow)?;
        Ok(Self::with_commodity(quantity, commodity))
    }

    /// Subtract another amount of the same commodity
    pub fn checked_sub(&self, other: &Amount) -> AmountResult<Amount> {
        self.checked_add(&other.negated())
    }

    /// Multiply; the result keeps the left commodity, or the right one if
    /// the left operand is a bare number
    pub fn checked_mul(&self, other: &Amount) -> AmountResult<Amount> {
        let quantity = self
            .quantity
            .checked_mul(other.quantity)
            .ok_or(AmountError::ArithmeticOverflow)?;
        let commodity = self.commodity.clone().or_else(|| other.commodity.clone());
        Ok(Self::with_commodity(quantity, commodity))
    }

    /// Divide; the result keeps the left commodity
    pub fn checked_div(&self, other: &Amount) -> AmountResult<Amount> {
        if other.is_zero() {
            return Err(AmountError::DivisionByZero);
        }
        let quantity = self
            .quantity
            .checked_div(other.quantity)
            .ok_or(AmountError::ArithmeticOverflow)?;
        let commodity = self.commodity.clone().or_else(|| other.commodity.clone());
        Ok(Self::with_commodity(quantity, commodity))
    }

    fn check_compatible(&self, other: &Amount) -> AmountResult<()> {
        match (&self.commodity, &other.commodity) {
            (Some(a), Some(b)) if a == b => Ok(()),
            (None, None) => Ok(()),
            _ if self.is_zero() || other.is_zero() => Ok(()),
            _ => Err(AmountError::CommodityMismatch(self.symbol().into(), other.symbol().into())),
        }
    }

    // Keeps whichever commodity instance displays more decimal places, so
    // `$10.00 + $5` prints as `$15.00`.
    fn merged_commodity(&self, other: &Amount) -> AmountResult<Option<CommodityRef>> {
        self.check_compatible(other)?;
        let chosen = match (&self.commodity, &other.commodity) {
            (Some(a), Some(b)) if a == b => {
                if b.precision() > a.precision() {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(a), _) if !self.is_zero() || other.commodity.is_none() => Some(a),
            (_, b) => b.as_ref(),
        };
        Ok(chosen.cloned())
    }

    fn quantity_string(&self) -> String {
        // Avoid printing `-0` for zero results.
        let quantity = if self.quantity.is_zero() { self.quantity.abs() } else { self.quantity };
        match &self.commodity {
            None => quantity.to_string(),
            Some(commodity) => {
                let mut places = usize::from(commodity.precision());
                if self.keep_precision {
                    places = places.max(quantity.normalize().scale() as usize);
                }
                format!("{:.*}", places, quantity)
            }
        }
    }
}

fn is_quantity_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == ','
}

impl PartialEq for Amount {
    fn eq(&self, other: &Self) -> bool {
        if self.is_zero() && other.is_zero() {
            return true;
        }
        self.symbol() == other.symbol() && self.quantity == other.quantity
    }
}

impl Eq for Amount {}

impl PartialOrd for Amount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other).ok()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quantity = self.quantity_string();
        let text = match &self.commodity {
            Some(commodity) => commodity.decorate(&quantity),
            None => quantity,
        };
        f.pad(&text)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::new(value)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Add<&Amount> for &Amount {
    type Output = AmountResult<Amount>;

    fn add(self, other: &Amount) -> Self::Output {
        self.checked_add(other)
    }
}

impl Sub<&Amount> for &Amount {
    type Output = AmountResult<Amount>;

    fn sub(self, other: &Amount) -> Self::Output {
        self.checked_sub(other)
    }
}

impl Mul<&Amount> for &Amount {
    type Output = AmountResult<Amount>;

    fn mul(self, other: &Amount) -> Self::Output {
        self.checked_mul(other)
    }
}

impl Div<&Amount> for &Amount {
    type Output = AmountResult<Amount>;

    fn div(self, other: &Amount) -> Self::Output {
        self.checked_div(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefixed() {
        let amount = Amount::parse("$10.00").unwrap();
        assert_eq!(amount.symbol(), "$");
        assert_eq!(amount.quantity(), Decimal::new(1000, 2));
        assert_eq!(amount.to_string(), "$10.00");
    }

    #[test]
    fn test_parse_suffixed_negative() {
        let amount = Amount::parse("-5 EUR").unwrap();
        assert_eq!(amount.sign(), -1);
        assert_eq!(amount.to_string(), "-5 EUR");
    }

    #[test]
    fn test_parse_negative_after_symbol() {
        let amount = Amount::parse("$-1,200.50").unwrap();
        assert_eq!(amount.quantity(), Decimal::new(-120050, 2));
        assert_eq!(amount.to_string(), "$-1200.50");
    }

    #[test]
    fn test_parse_bare_number() {
        let amount = Amount::parse("42").unwrap();
        assert!(!amount.has_commodity());
        assert_eq!(amount.to_string(), "42");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("$").is_err());
        assert!(Amount::parse("10 A B").is_err());
    }

    #[test]
    fn test_add_keeps_wider_precision() {
        let a = Amount::parse("$5").unwrap();
        let b = Amount::parse("$10.00").unwrap();
        assert_eq!((&a + &b).unwrap().to_string(), "$15.00");
    }

    #[test]
    fn test_commodity_mismatch() {
        let a = Amount::parse("$5").unwrap();
        let b = Amount::parse("5 EUR").unwrap();
        assert!(matches!(&a + &b, Err(AmountError::CommodityMismatch(_, _))));
    }

    #[test]
    fn test_negate_zero_prints_without_sign() {
        let zero = Amount::parse("$0.00").unwrap();
        assert_eq!(zero.negated().to_string(), "$0.00");
    }

    #[test]
    fn test_per_unit_price() {
        let cost = Amount::parse("$50.00").unwrap();
        let count = Amount::parse("10 AAPL").unwrap();
        let price = cost.per_unit(&count).unwrap();
        assert_eq!(price.unrounded().to_string(), "$5.00");
        assert!(cost.per_unit(&Amount::from_i64(0)).is_err());
    }

    #[test]
    fn test_display_honors_width() {
        let amount = Amount::parse("$1.50").unwrap();
        assert_eq!(format!("{:>8}", amount), "   $1.50");
        assert_eq!(format!("{:<8}|", amount), "$1.50   |");
    }
}
