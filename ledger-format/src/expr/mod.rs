//! Value expression evaluation
//!
//! This module provides the small expression language embedded in format
//! strings as `%(expr)` and used for the amount, total and display
//! predicate expressions:
//! - Arithmetic operations (+, -, *, /)
//! - Comparison operations (==, !=, <, >, <=, >=)
//! - Logical operations (&&, ||, !)
//! - `{$1.00}` amount literals and `/regex/` account masks
//! - Identifiers bound to the record being reported on

use std::fmt;

use chrono::{Local, NaiveTime};
use ledger_math::{AmountError, BalanceError};
use regex::Regex;
use thiserror::Error;

use crate::details::Details;
use crate::journal::{TransactionFlags, TransactionState};

pub mod parser;
pub mod predicate;
pub mod value;

pub use predicate::ItemPredicate;
pub use value::Value;

/// Error types for expression parsing and evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Identifier not bound to any report value
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// Operands of incompatible kinds
    #[error("Type mismatch in {operation}: {expected} and {found}")]
    TypeMismatch {
        /// Kind of the left operand
        expected: String,
        /// Kind of the right operand
        found: String,
        /// Operation attempted
        operation: String,
    },

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Malformed expression text
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Amount operation error
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Balance operation error
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

/// Result type for expression operations
pub type ExprResult<T> = Result<T, ExprError>;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,

    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,

    /// `&&`, short-circuiting
    And,
    /// `||`, short-circuiting
    Or,
}

impl BinaryOp {
    /// Get operator precedence (higher number = higher precedence)
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq | BinaryOp::Ne => 3,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        };
        write!(f, "{}", op)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT (!)
    Not,
}

/// Report values an identifier can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ident {
    /// `amount`, `a`
    Amount,
    /// `total`, `t`
    Total,
    /// `cost`, `b`
    Cost,
    /// `date`, `d`
    Date,
    /// `now`, `m`
    Now,
    /// `depth`, `l`
    Depth,
    /// `cleared`, `X`
    Cleared,
    /// `pending`
    Pending,
    /// `real`, `R`
    Real,
    /// `virtual`
    Virtual,
    /// `count`, `N`
    Count,
}

impl Ident {
    /// Resolve an identifier name, long or single-letter
    pub fn lookup(name: &str) -> Option<Self> {
        let ident = match name {
            "amount" | "a" => Ident::Amount,
            "total" | "t" => Ident::Total,
            "cost" | "b" => Ident::Cost,
            "date" | "d" => Ident::Date,
            "now" | "m" => Ident::Now,
            "depth" | "l" => Ident::Depth,
            "cleared" | "X" => Ident::Cleared,
            "pending" => Ident::Pending,
            "real" | "R" => Ident::Real,
            "virtual" => Ident::Virtual,
            "count" | "N" => Ident::Count,
            _ => return None,
        };
        Some(ident)
    }
}

/// A `/regex/` matched against the current account's full name
#[derive(Debug, Clone)]
pub struct AccountMask {
    pattern: String,
    regex: Regex,
}

impl AccountMask {
    /// Compile a mask; matching is case-insensitive
    pub fn new(pattern: &str) -> ExprResult<Self> {
        let regex = Regex::new(&format!("(?i){}", pattern))
            .map_err(|e| ExprError::ParseError(format!("Invalid account mask /{}/: {}", pattern, e)))?;
        Ok(Self { pattern: pattern.to_string(), regex })
    }

    /// Check a name against the mask
    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl PartialEq for AccountMask {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// Literal value
    Value(Value),

    /// Report value reference
    Ident(Ident),

    /// Account name match
    Mask(AccountMask),

    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<ExprNode>,
        /// Right operand
        right: Box<ExprNode>,
    },

    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<ExprNode>,
    },
}

impl ExprNode {
    fn is_constant(&self) -> bool {
        matches!(self, ExprNode::Value(_))
    }

    // Fold operations on literals; anything that fails to fold is left for
    // evaluation so the error surfaces against a real record.
    fn fold(self) -> ExprNode {
        match self {
            ExprNode::Binary { op, left, right } => {
                let left = left.fold();
                let right = right.fold();
                if let (ExprNode::Value(l), ExprNode::Value(r)) = (&left, &right) {
                    if let Ok(value) = apply_binary(op, l, r) {
                        return ExprNode::Value(value);
                    }
                }
                ExprNode::Binary { op, left: Box::new(left), right: Box::new(right) }
            }
            ExprNode::Unary { op, operand } => {
                let operand = operand.fold();
                if let ExprNode::Value(v) = &operand {
                    if let Ok(value) = apply_unary(op, v) {
                        return ExprNode::Value(value);
                    }
                }
                ExprNode::Unary { op, operand: Box::new(operand) }
            }
            node => node,
        }
    }

    fn evaluate(&self, details: &Details<'_>) -> ExprResult<Value> {
        match self {
            ExprNode::Value(v) => Ok(v.clone()),
            ExprNode::Ident(ident) => resolve(*ident, details),
            ExprNode::Mask(mask) => Ok(Value::Boolean(
                details.account.is_some_and(|a| mask.is_match(&details.journal.fullname(a))),
            )),
            ExprNode::Binary { op: BinaryOp::And, left, right } => {
                if !left.evaluate(details)?.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                Ok(Value::Boolean(right.evaluate(details)?.is_truthy()))
            }
            ExprNode::Binary { op: BinaryOp::Or, left, right } => {
                if left.evaluate(details)?.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                Ok(Value::Boolean(right.evaluate(details)?.is_truthy()))
            }
            ExprNode::Binary { op, left, right } => {
                apply_binary(*op, &left.evaluate(details)?, &right.evaluate(details)?)
            }
            ExprNode::Unary { op, operand } => apply_unary(*op, &operand.evaluate(details)?),
        }
    }
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> ExprResult<Value> {
    use std::cmp::Ordering;
    match op {
        BinaryOp::Add => left.add(right),
        BinaryOp::Sub => left.subtract(right),
        BinaryOp::Mul => left.multiply(right),
        BinaryOp::Div => left.divide(right),
        BinaryOp::Eq => Ok(Value::Boolean(left == right)),
        BinaryOp::Ne => Ok(Value::Boolean(left != right)),
        BinaryOp::Lt => Ok(Value::Boolean(left.compare(right)? == Ordering::Less)),
        BinaryOp::Gt => Ok(Value::Boolean(left.compare(right)? == Ordering::Greater)),
        BinaryOp::Le => Ok(Value::Boolean(left.compare(right)? != Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Boolean(left.compare(right)? != Ordering::Less)),
        BinaryOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
    }
}

fn apply_unary(op: UnaryOp, operand: &Value) -> ExprResult<Value> {
    match op {
        UnaryOp::Neg => operand.negated(),
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
    }
}

fn resolve(ident: Ident, details: &Details<'_>) -> ExprResult<Value> {
    let state = details.state;
    let value = match ident {
        Ident::Amount => match (details.xact, details.account) {
            (Some(xact), _) => Value::Amount(xact.amount.clone()),
            (None, Some(account)) => match details.value {
                Some(value) => value.clone(),
                None => state.account(account.id).map(|x| x.value.clone()).unwrap_or_default(),
            },
            (None, None) => Value::Null,
        },
        Ident::Total => match (details.xact, details.account) {
            (Some(xact), _) => state.xact(xact.id).map(|x| x.total.clone()).unwrap_or_default(),
            (None, Some(account)) => match details.value {
                Some(value) => value.clone(),
                None => state.account(account.id).map(|x| x.total.clone()).unwrap_or_default(),
            },
            (None, None) => Value::Null,
        },
        Ident::Cost => match details.xact {
            Some(xact) => Value::Amount(xact.cost.clone().unwrap_or_else(|| xact.amount.clone())),
            None => return resolve(Ident::Amount, details),
        },
        Ident::Date => match details.report_date() {
            Some(date) => Value::DateTime(date.and_time(NaiveTime::MIN)),
            None => Value::Null,
        },
        Ident::Now => Value::DateTime(Local::now().naive_local()),
        Ident::Depth => match details.account {
            Some(account) => Value::Integer(account.depth as i64),
            None => Value::Integer(0),
        },
        Ident::Cleared => Value::Boolean(details.state_of() == Some(TransactionState::Cleared)),
        Ident::Pending => Value::Boolean(details.state_of() == Some(TransactionState::Pending)),
        Ident::Real => {
            Value::Boolean(!details.xact.is_some_and(|x| x.has_flags(TransactionFlags::VIRTUAL)))
        }
        Ident::Virtual => {
            Value::Boolean(details.xact.is_some_and(|x| x.has_flags(TransactionFlags::VIRTUAL)))
        }
        Ident::Count => {
            let count = match (details.xact, details.account) {
                (Some(xact), _) => state.xact(xact.id).map_or(0, |x| x.index + 1),
                (None, Some(account)) => state.account(account.id).map_or(0, |x| x.total_count),
                (None, None) => 0,
            };
            Value::Integer(count as i64)
        }
    };
    Ok(value)
}

/// A parsed value expression
#[derive(Debug, Clone, PartialEq)]
pub struct ValueExpr {
    root: ExprNode,
    source: String,
}

impl ValueExpr {
    /// Parse an expression; empty text yields the null expression
    pub fn parse(input: &str) -> ExprResult<Self> {
        let root = if input.trim().is_empty() {
            ExprNode::Value(Value::Null)
        } else {
            parser::parse_expression(input)?
        };
        Ok(Self { root, source: input.to_string() })
    }

    /// Fold constant sub-expressions
    pub fn compile(self) -> Self {
        Self { root: self.root.fold(), source: self.source }
    }

    /// Evaluate against the current record
    pub fn calc(&self, details: &Details<'_>) -> ExprResult<Value> {
        self.root.evaluate(details)
    }

    /// Root AST node
    pub fn root(&self) -> &ExprNode {
        &self.root
    }

    /// Check if expression is a constant value
    pub fn is_constant(&self) -> bool {
        self.root.is_constant()
    }

    /// Source text as written
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
