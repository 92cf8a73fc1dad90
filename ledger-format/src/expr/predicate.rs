//! Display predicates
//!
//! A predicate is a value expression evaluated for its truthiness against
//! the record being reported on. Constant predicates are recognised once at
//! construction so that `1` or an empty string skip evaluation entirely.

use std::fmt;

use super::{ExprResult, ValueExpr};
use crate::details::Details;

/// Wrapper for expressions used as display predicates
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPredicate {
    expression: ValueExpr,
    always: Option<bool>,
}

impl ItemPredicate {
    /// Wrap an already parsed expression
    pub fn new(expression: ValueExpr) -> Self {
        let expression = expression.compile();
        let always = match expression.root() {
            super::ExprNode::Value(value) if value.is_null() => Some(true),
            super::ExprNode::Value(value) => Some(value.is_truthy()),
            _ => None,
        };
        Self { expression, always }
    }

    /// Parse a predicate; empty text accepts everything
    pub fn parse(input: &str) -> ExprResult<Self> {
        Ok(Self::new(ValueExpr::parse(input)?))
    }

    /// Check if the predicate holds for a record
    pub fn matches(&self, details: &Details<'_>) -> ExprResult<bool> {
        match self.always {
            Some(result) => Ok(result),
            None => Ok(self.expression.calc(details)?.is_truthy()),
        }
    }

    /// Predicate text as written
    pub fn source(&self) -> &str {
        self.expression.source()
    }
}

impl fmt::Display for ItemPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Journal;
    use crate::xdata::ReportState;

    #[test]
    fn test_constant_predicates() {
        let journal = Journal::new();
        let state = ReportState::new();
        let details = Details::new(&journal, &state);

        assert!(ItemPredicate::parse("").unwrap().matches(&details).unwrap());
        assert!(ItemPredicate::parse("1").unwrap().matches(&details).unwrap());
        assert!(!ItemPredicate::parse("2 < 1").unwrap().matches(&details).unwrap());
    }

    #[test]
    fn test_predicate_on_account() {
        let mut journal = Journal::new();
        let cash = journal.find_account("Assets:Cash", true).unwrap();
        let state = ReportState::new();
        let details = Details::for_account(&journal, &state, journal.account(cash));

        let predicate = ItemPredicate::parse("/cash/ && depth == 2").unwrap();
        assert!(predicate.matches(&details).unwrap());
        assert_eq!(predicate.source(), "/cash/ && depth == 2");
        assert!(!ItemPredicate::parse("/^Expenses/").unwrap().matches(&details).unwrap());
    }
}
