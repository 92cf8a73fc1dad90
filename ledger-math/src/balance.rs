//! Balance module providing multi-commodity amounts containers
//!
//! A [`Balance`] holds at most one amount per commodity, kept in commodity
//! symbol order so that multi-line output is stable. A [`BalancePair`] adds
//! the cost basis that was paid for the quantity.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Neg;

use crate::amount::{Amount, AmountError};

/// Error type for balance operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// Cannot convert empty balance to amount
    #[error("Cannot convert an empty balance to an amount")]
    EmptyToAmount,

    /// Cannot convert multi-commodity balance to amount
    #[error("Cannot convert a balance with multiple commodities to an amount")]
    MultiCommodityToAmount,

    /// Amount operation error
    #[error("Amount operation failed: {0}")]
    AmountError(#[from] AmountError),
}

/// Result type for balance operations
pub type BalanceResult<T> = Result<T, BalanceError>;

/// Balance container for amounts of different commodities
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balance {
    amounts: BTreeMap<String, Amount>,
}

impl Balance {
    /// Create a new empty balance
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a balance from a single amount
    pub fn from_amount(amount: &Amount) -> BalanceResult<Self> {
        let mut balance = Self::new();
        balance.add_amount(amount)?;
        Ok(balance)
    }

    /// Check if balance is empty (contains no amounts)
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Check if every component is zero
    pub fn is_zero(&self) -> bool {
        self.amounts.values().all(Amount::is_zero)
    }

    /// Number of distinct commodities held
    pub fn commodity_count(&self) -> usize {
        self.amounts.len()
    }

    /// The only amount of a single-commodity balance
    pub fn single_amount(&self) -> Option<&Amount> {
        if self.amounts.len() == 1 {
            self.amounts.values().next()
        } else {
            None
        }
    }

    /// Convert to a single amount; zero for an empty balance
    pub fn to_amount(&self) -> BalanceResult<Amount> {
        match self.amounts.len() {
            0 => Err(BalanceError::EmptyToAmount),
            1 => self.single_amount().cloned().ok_or(BalanceError::EmptyToAmount),
            _ => Err(BalanceError::MultiCommodityToAmount),
        }
    }

    /// Get the amount held in `symbol`
    pub fn commodity_amount(&self, symbol: &str) -> Option<&Amount> {
        self.amounts.get(symbol)
    }

    /// Iterate over amounts in commodity order
    pub fn amounts(&self) -> impl Iterator<Item = &Amount> {
        self.amounts.values()
    }

    /// True if any component is below zero
    pub fn has_negative(&self) -> bool {
        self.amounts.values().any(|a| a.sign() < 0)
    }

    /// True if any component is above zero
    pub fn has_positive(&self) -> bool {
        self.amounts.values().any(|a| a.sign() > 0)
    }

    /// Add an amount to this balance, dropping components that reach zero
    pub fn add_amount(&mut self, amount: &Amount) -> BalanceResult<()> {
        let key = amount.symbol().to_string();
        let sum = match self.amounts.get(&key) {
            Some(existing) => existing.checked_add(amount)?,
            None => amount.clone(),
        };
        if sum.is_zero() {
            self.amounts.remove(&key);
        } else {
            self.amounts.insert(key, sum);
        }
        Ok(())
    }

    /// Subtract an amount from this balance
    pub fn subtract_amount(&mut self, amount: &Amount) -> BalanceResult<()> {
        self.add_amount(&amount.negated())
    }

    /// Add every component of another balance
    pub fn add_balance(&mut self, other: &Balance) -> BalanceResult<()> {
        for amount in other.amounts() {
            self.add_amount(amount)?;
        }
        Ok(())
    }

    /// Multiply every component by a bare number
    pub fn multiply_by(&mut self, factor: &Amount) -> BalanceResult<()> {
        for amount in self.amounts.values_mut() {
            *amount = amount.checked_mul(&factor.number())?;
        }
        self.amounts.retain(|_, a| !a.is_zero());
        Ok(())
    }

    /// Divide every component by a bare number
    pub fn divide_by(&mut self, divisor: &Amount) -> BalanceResult<()> {
        for amount in self.amounts.values_mut() {
            *amount = amount.checked_div(&divisor.number())?;
        }
        Ok(())
    }

    /// Create a new balance with all amounts negated
    pub fn negated(&self) -> Balance {
        let amounts = self.amounts.iter().map(|(k, a)| (k.clone(), a.negated())).collect();
        Balance { amounts }
    }

    /// Negate all amounts in place
    pub fn negate(&mut self) {
        for amount in self.amounts.values_mut() {
            amount.in_place_negate();
        }
    }

    /// Print one right-justified line per commodity
    ///
    /// The first line is padded to `first_width`, later lines to
    /// `latter_width`. An empty balance prints as `0`.
    pub fn print<W: fmt::Write>(
        &self,
        writer: &mut W,
        first_width: usize,
        latter_width: usize,
    ) -> fmt::Result {
        if self.amounts.is_empty() {
            return write!(writer, "{:>width$}", "0", width = first_width);
        }
        for (i, amount) in self.amounts.values().enumerate() {
            if i == 0 {
                write!(writer, "{:>width$}", amount, width = first_width)?;
            } else {
                write!(writer, "\n{:>width$}", amount, width = latter_width)?;
            }
        }
        Ok(())
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        let mut balance = Balance::new();
        if !amount.is_zero() {
            balance.amounts.insert(amount.symbol().to_string(), amount);
        }
        balance
    }
}

impl Neg for Balance {
    type Output = Balance;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = f.width().unwrap_or(0);
        self.print(f, width, width)
    }
}

/// A quantity balance together with the cost paid for it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BalancePair {
    quantity: Balance,
    cost: Option<Balance>,
}

impl BalancePair {
    /// Create a pair with no recorded cost
    pub fn new(quantity: Balance) -> Self {
        Self { quantity, cost: None }
    }

    /// Create a pair with an explicit cost balance
    pub fn with_cost(quantity: Balance, cost: Balance) -> Self {
        Self { quantity, cost: Some(cost) }
    }

    /// The quantity side
    pub fn quantity(&self) -> &Balance {
        &self.quantity
    }

    /// The cost side, if any cost was recorded
    pub fn cost(&self) -> Option<&Balance> {
        self.cost.as_ref()
    }

    /// Add an amount, with its cost when one was paid
    ///
    /// Postings without a cost count at their own value on the cost side.
    pub fn add_amount(&mut self, amount: &Amount, cost: Option<&Amount>) -> BalanceResult<()> {
        if cost.is_some() && self.cost.is_none() {
            self.cost = Some(self.quantity.clone());
        }
        self.quantity.add_amount(amount)?;
        if let Some(cost_side) = self.cost.as_mut() {
            cost_side.add_amount(cost.unwrap_or(amount))?;
        }
        Ok(())
    }

    /// Add another pair component-wise
    pub fn add_pair(&mut self, other: &BalancePair) -> BalanceResult<()> {
        match (&mut self.cost, &other.cost) {
            (Some(mine), Some(theirs)) => mine.add_balance(theirs)?,
            (Some(mine), None) => mine.add_balance(&other.quantity)?,
            (None, Some(theirs)) => {
                let mut cost = self.quantity.clone();
                cost.add_balance(theirs)?;
                self.cost = Some(cost);
            }
            (None, None) => {}
        }
        self.quantity.add_balance(&other.quantity)
    }

    /// Create a new pair with both sides negated
    pub fn negated(&self) -> BalancePair {
        BalancePair { quantity: self.quantity.negated(), cost: self.cost.as_ref().map(Balance::negated) }
    }
}

impl From<Balance> for BalancePair {
    fn from(quantity: Balance) -> Self {
        Self::new(quantity)
    }
}

impl fmt::Display for BalancePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.quantity, f)
    }
}
