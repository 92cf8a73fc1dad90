// Behavioral tests for amounts and balances as the report layer uses them

use std::sync::Arc;

use ledger_math::{Amount, Balance, BalancePair, Commodity, Decimal};
use proptest::prelude::*;

fn dollars(cents: i64) -> Amount {
    Amount::with_commodity(Decimal::new(cents, 2), Some(Arc::new(Commodity::with_precision("$", 2))))
}

#[cfg(test)]
mod amount_basic_tests {
    use super::*;

    #[test]
    fn test_integer_amounts() {
        let a = Amount::from_i64(100);
        assert!(!a.is_zero());
        assert_eq!(a.sign(), 1);
        assert_eq!(Amount::from_i64(-50).sign(), -1);
        assert_eq!(Amount::from_i64(0).sign(), 0);
    }

    #[test]
    fn test_arithmetic_operations() {
        let a = Amount::from_i64(100);
        let b = Amount::from_i64(50);

        assert_eq!((&a + &b).unwrap(), Amount::from_i64(150));
        assert_eq!((&a - &b).unwrap(), Amount::from_i64(50));
        assert_eq!((&a * &b).unwrap(), Amount::from_i64(5000));
        assert_eq!((&a / &b).unwrap(), Amount::from_i64(2));
        assert!((&a / &Amount::from_i64(0)).is_err());
    }

    #[test]
    fn test_scaling_keeps_commodity() {
        let price = dollars(250);
        let scaled = (&price * &Amount::from_i64(4)).unwrap();
        assert_eq!(scaled.to_string(), "$10.00");
        let scaled = (&Amount::from_i64(4) * &price).unwrap();
        assert_eq!(scaled.symbol(), "$");
    }

    #[test]
    fn test_zero_amounts_compare_equal() {
        let zero_dollars = dollars(0);
        let zero_euros = Amount::parse("0 EUR").unwrap();
        assert_eq!(zero_dollars, zero_euros);
        assert!((&zero_dollars + &Amount::parse("3 EUR").unwrap()).is_ok());
    }

    #[test]
    fn test_ordering_within_commodity() {
        assert!(dollars(100) < dollars(200));
        assert_eq!(dollars(100).partial_cmp(&Amount::parse("1 EUR").unwrap()), None);
    }
}

#[cfg(test)]
mod balance_tests {
    use super::*;

    #[test]
    fn test_single_commodity_balance() {
        let balance = Balance::from_amount(&dollars(1050)).unwrap();
        assert_eq!(balance.commodity_count(), 1);
        assert_eq!(balance.single_amount(), Some(&dollars(1050)));
        assert_eq!(balance.to_amount().unwrap().to_string(), "$10.50");
    }

    #[test]
    fn test_multi_commodity_balance() {
        let mut balance = Balance::new();
        balance.add_amount(&dollars(500)).unwrap();
        balance.add_amount(&Amount::parse("3 EUR").unwrap()).unwrap();
        assert_eq!(balance.commodity_count(), 2);
        assert!(balance.single_amount().is_none());
        assert!(balance.to_amount().is_err());
        assert_eq!(balance.to_string(), "$5.00\n3 EUR");
    }

    #[test]
    fn test_negated_balance() {
        let mut balance = Balance::new();
        balance.add_amount(&dollars(500)).unwrap();
        balance.add_amount(&Amount::parse("-3 EUR").unwrap()).unwrap();
        let negated = -balance.clone();
        assert!(negated.has_negative());
        assert!(negated.has_positive());
        assert_eq!(negated.commodity_amount("$"), Some(&dollars(-500)));

        let mut in_place = balance;
        in_place.negate();
        assert_eq!(in_place, negated);
    }

    #[test]
    fn test_pair_without_cost_prints_quantity() {
        let pair = BalancePair::new(Balance::from_amount(&dollars(700)).unwrap());
        assert!(pair.cost().is_none());
        assert_eq!(pair.to_string(), "$7.00");
    }

    #[test]
    fn test_pair_addition_backfills_cost() {
        let mut left = BalancePair::new(Balance::from_amount(&dollars(100)).unwrap());
        let right = BalancePair::with_cost(
            Balance::from_amount(&Amount::parse("2 AAPL").unwrap()).unwrap(),
            Balance::from_amount(&dollars(300)).unwrap(),
        );
        left.add_pair(&right).unwrap();
        assert_eq!(left.quantity().commodity_count(), 2);
        assert_eq!(left.cost().and_then(|c| c.commodity_amount("$")), Some(&dollars(400)));
    }
}

proptest! {
    #[test]
    fn adding_then_subtracting_leaves_balance_empty(cents in -1_000_000i64..1_000_000) {
        let mut balance = Balance::new();
        balance.add_amount(&dollars(cents)).unwrap();
        balance.subtract_amount(&dollars(cents)).unwrap();
        prop_assert!(balance.is_empty());
    }

    #[test]
    fn negation_is_an_involution(cents in -1_000_000i64..1_000_000) {
        let amount = dollars(cents);
        prop_assert_eq!(amount.negated().negated(), amount);
    }
}
