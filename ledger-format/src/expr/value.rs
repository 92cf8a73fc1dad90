//! Values produced by value expressions
//!
//! Arithmetic promotes as it goes: two amounts of different commodities add
//! up to a [`Balance`], and a balance left holding a single commodity is
//! folded back into an amount.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDateTime;
use ledger_math::{Amount, Balance, BalancePair, Decimal};

use super::{ExprError, ExprResult};

/// Result of evaluating a value expression
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Empty expression or missing data
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Date and time
    DateTime(NaiveDateTime),
    /// Single-commodity amount
    Amount(Amount),
    /// Multi-commodity balance
    Balance(Balance),
    /// Balance together with its cost basis
    BalancePair(BalancePair),
}

impl Value {
    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::DateTime(_) => "datetime",
            Value::Amount(_) => "amount",
            Value::Balance(_) => "balance",
            Value::BalancePair(_) => "balance pair",
        }
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is truthy for logical operations
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::DateTime(_) => true,
            Value::Amount(a) => !a.is_zero(),
            Value::Balance(b) => !b.is_zero(),
            Value::BalancePair(p) => !p.quantity().is_zero(),
        }
    }

    /// Sign of a numeric value; `None` for booleans, dates and null
    ///
    /// A balance counts as negative if any of its components is.
    pub fn sign(&self) -> Option<i32> {
        match self {
            Value::Integer(i) => Some(i.signum() as i32),
            Value::Amount(a) => Some(a.sign()),
            Value::Balance(b) => Some(balance_sign(b)),
            Value::BalancePair(p) => Some(balance_sign(p.quantity())),
            _ => None,
        }
    }

    /// The value viewed as a balance, for numeric kinds and null
    pub fn to_balance(&self) -> Option<Balance> {
        match self {
            Value::Null => Some(Balance::new()),
            Value::Integer(i) => Some(Balance::from(Amount::from_i64(*i))),
            Value::Amount(a) => Some(Balance::from(a.clone())),
            Value::Balance(b) => Some(b.clone()),
            Value::BalancePair(p) => Some(p.quantity().clone()),
            Value::Boolean(_) | Value::DateTime(_) => None,
        }
    }

    /// Per-commodity components of a balance-like value
    ///
    /// `None` for single amounts and non-numeric values, which are shown
    /// on one line.
    pub fn components(&self) -> Option<Vec<Amount>> {
        match self {
            Value::Balance(b) => Some(b.amounts().cloned().collect()),
            Value::BalancePair(p) => Some(p.quantity().amounts().cloned().collect()),
            _ => None,
        }
    }

    /// Add two values, promoting to a balance across commodities
    pub fn add(&self, other: &Value) -> ExprResult<Value> {
        use Value::*;
        match (self, other) {
            (Null, v) | (v, Null) => Ok(v.clone()),
            (Integer(a), Integer(b)) => {
                a.checked_add(*b).map(Integer).ok_or(ExprError::Overflow)
            }
            (BalancePair(a), b) => {
                let mut sum = a.clone();
                add_to_pair(&mut sum, b)?;
                Ok(BalancePair(sum))
            }
            (a, BalancePair(b)) => {
                let mut sum = b.clone();
                add_to_pair(&mut sum, a)?;
                Ok(BalancePair(sum))
            }
            (Amount(a), Amount(b)) => match a.checked_add(b) {
                Ok(sum) => Ok(Amount(sum)),
                Err(ledger_math::AmountError::CommodityMismatch(..)) => {
                    let mut balance = ledger_math::Balance::from(a.clone());
                    balance.add_amount(b)?;
                    Ok(Value::from(balance))
                }
                Err(err) => Err(err.into()),
            },
            (a, b) => match (a.to_balance(), b.to_balance()) {
                (Some(mut left), Some(right)) => {
                    left.add_balance(&right)?;
                    Ok(Value::from(left))
                }
                _ => Err(mismatch(a, b, "addition")),
            },
        }
    }

    /// Add another value into this one
    pub fn add_assign(&mut self, other: &Value) -> ExprResult<()> {
        *self = self.add(other)?;
        Ok(())
    }

    /// Subtract a value
    pub fn subtract(&self, other: &Value) -> ExprResult<Value> {
        self.add(&other.negated()?)
    }

    /// Multiply by a value; balances scale by bare numbers only
    pub fn multiply(&self, other: &Value) -> ExprResult<Value> {
        use Value::*;
        match (self, other) {
            (Integer(a), Integer(b)) => {
                a.checked_mul(*b).map(Integer).ok_or(ExprError::Overflow)
            }
            (Balance(b), n) | (n, Balance(b)) => {
                let factor = n.to_amount().ok_or_else(|| mismatch(self, other, "multiplication"))?;
                let mut scaled = b.clone();
                scaled.multiply_by(&factor)?;
                Ok(Value::from(scaled))
            }
            (a, b) => match (a.to_amount(), b.to_amount()) {
                (Some(x), Some(y)) => Ok(Amount(x.checked_mul(&y)?)),
                _ => Err(mismatch(a, b, "multiplication")),
            },
        }
    }

    /// Divide by a value
    pub fn divide(&self, other: &Value) -> ExprResult<Value> {
        use Value::*;
        if other.sign() == Some(0) {
            return Err(ExprError::DivisionByZero);
        }
        match (self, other) {
            (Integer(a), Integer(b)) => Ok(Amount(
                ledger_math::Amount::from_i64(*a).checked_div(&ledger_math::Amount::from_i64(*b))?,
            )),
            (Balance(b), n) => {
                let divisor = n.to_amount().ok_or_else(|| mismatch(self, other, "division"))?;
                let mut scaled = b.clone();
                scaled.divide_by(&divisor)?;
                Ok(Balance(scaled))
            }
            (a, b) => match (a.to_amount(), b.to_amount()) {
                (Some(x), Some(y)) => Ok(Amount(x.checked_div(&y)?)),
                _ => Err(mismatch(a, b, "division")),
            },
        }
    }

    /// Arithmetic negation
    pub fn negated(&self) -> ExprResult<Value> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Integer(i) => i.checked_neg().map(Value::Integer).ok_or(ExprError::Overflow),
            Value::Amount(a) => Ok(Value::Amount(a.negated())),
            Value::Balance(b) => Ok(Value::Balance(b.negated())),
            Value::BalancePair(p) => Ok(Value::BalancePair(p.negated())),
            Value::Boolean(_) | Value::DateTime(_) => Err(ExprError::TypeMismatch {
                expected: "number".to_string(),
                found: self.type_name().to_string(),
                operation: "negation".to_string(),
            }),
        }
    }

    /// Order two values
    ///
    /// Numbers without a commodity compare against any amount by quantity.
    /// A multi-commodity balance only orders against zero, and only when all
    /// of its components share a sign.
    pub fn compare(&self, other: &Value) -> ExprResult<Ordering> {
        use Value::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => Ok(a.cmp(b)),
            (Integer(a), Integer(b)) => Ok(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Ok(a.cmp(b)),
            _ => {
                let (left, right) = match (self.to_balance(), other.to_balance()) {
                    (Some(l), Some(r)) => (l, r),
                    _ => return Err(mismatch(self, other, "comparison")),
                };
                compare_balances(&left, &right).ok_or_else(|| mismatch(self, other, "comparison"))
            }
        }
    }

    fn to_amount(&self) -> Option<Amount> {
        match self {
            Value::Null => Some(Amount::from_i64(0)),
            Value::Integer(i) => Some(Amount::from_i64(*i)),
            Value::Amount(a) => Some(a.clone()),
            Value::Balance(b) => b.single_amount().cloned(),
            Value::BalancePair(p) => p.quantity().single_amount().cloned(),
            Value::Boolean(_) | Value::DateTime(_) => None,
        }
    }
}

fn balance_sign(balance: &Balance) -> i32 {
    if balance.has_negative() {
        -1
    } else if balance.has_positive() {
        1
    } else {
        0
    }
}

fn add_to_pair(pair: &mut BalancePair, value: &Value) -> ExprResult<()> {
    match value {
        Value::BalancePair(other) => pair.add_pair(other)?,
        other => {
            let balance = other.to_balance().ok_or_else(|| {
                mismatch(&Value::BalancePair(pair.clone()), other, "addition")
            })?;
            pair.add_pair(&BalancePair::new(balance))?;
        }
    }
    Ok(())
}

fn compare_balances(left: &Balance, right: &Balance) -> Option<Ordering> {
    let single = |b: &Balance| match b.commodity_count() {
        0 => Some(Amount::from_i64(0)),
        1 => b.single_amount().cloned(),
        _ => None,
    };
    match (single(left), single(right)) {
        (Some(a), Some(b)) => {
            if a.has_commodity() && b.has_commodity() && a.symbol() != b.symbol() {
                None
            } else {
                Some(a.quantity().cmp(&b.quantity()))
            }
        }
        (None, Some(b)) if b.is_zero() => sign_ordering(balance_sign_strict(left)?),
        (Some(a), None) if a.is_zero() => {
            sign_ordering(balance_sign_strict(right)?).map(Ordering::reverse)
        }
        _ => None,
    }
}

fn balance_sign_strict(balance: &Balance) -> Option<i32> {
    match (balance.has_negative(), balance.has_positive()) {
        (true, true) => None,
        (true, false) => Some(-1),
        (false, true) => Some(1),
        (false, false) => Some(0),
    }
}

fn sign_ordering(sign: i32) -> Option<Ordering> {
    Some(sign.cmp(&0))
}

fn mismatch(a: &Value, b: &Value, operation: &str) -> ExprError {
    ExprError::TypeMismatch {
        expected: a.type_name().to_string(),
        found: b.type_name().to_string(),
        operation: operation.to_string(),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            _ => match (self.to_balance(), other.to_balance()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl From<Amount> for Value {
    fn from(amount: Amount) -> Self {
        Value::Amount(amount)
    }
}

impl From<Balance> for Value {
    fn from(balance: Balance) -> Self {
        match balance.commodity_count() {
            0 => Value::Amount(Amount::new(Decimal::ZERO)),
            1 => match balance.single_amount() {
                Some(amount) => Value::Amount(amount.clone()),
                None => Value::Balance(balance),
            },
            _ => Value::Balance(balance),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y/%m/%d %H:%M:%S")),
            Value::Amount(a) => write!(f, "{}", a),
            Value::Balance(b) => write!(f, "{}", b),
            Value::BalancePair(p) => write!(f, "{}", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(text: &str) -> Value {
        Value::Amount(Amount::parse(text).unwrap())
    }

    #[test]
    fn test_mixed_commodities_promote_to_balance() {
        let sum = amt("$10.00").add(&amt("5 EUR")).unwrap();
        assert!(matches!(sum, Value::Balance(_)));
        assert_eq!(sum.components().map(|c| c.len()), Some(2));

        let back = sum.subtract(&amt("5 EUR")).unwrap();
        assert!(matches!(back, Value::Amount(_)));
        assert_eq!(back, amt("$10.00"));
    }

    #[test]
    fn test_null_is_additive_identity() {
        assert_eq!(Value::Null.add(&amt("$3.00")).unwrap(), amt("$3.00"));
        assert_eq!(Value::Null, Value::Integer(0));
    }

    #[test]
    fn test_compare_bare_number_with_amount() {
        assert_eq!(amt("$-4.00").compare(&Value::Integer(0)).unwrap(), Ordering::Less);
        assert_eq!(amt("$4.00").compare(&Value::Integer(4)).unwrap(), Ordering::Equal);
        assert!(amt("$4.00").compare(&amt("4 EUR")).is_err());
    }

    #[test]
    fn test_sign_of_balance() {
        let mixed = amt("$10.00").add(&amt("-5 EUR")).unwrap();
        assert_eq!(mixed.sign(), Some(-1));
        assert!(mixed.compare(&Value::Integer(0)).is_err());
        assert_eq!(Value::Boolean(true).sign(), None);
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(amt("$4.00").divide(&Value::Integer(0)), Err(ExprError::DivisionByZero));
    }
}
