//! Shared pricing rules.
//!
//! Both the client (for display) and the server (authoritatively) price a cart
//! through these functions, so the two can never drift apart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Drink add-on for a line item. Absence (`None` at the use sites) costs
/// nothing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Drink {
    Cola,
    Lemonade,
    Water,
}

impl Drink {
    pub fn as_str(&self) -> &'static str {
        match self {
            Drink::Cola => "cola",
            Drink::Lemonade => "lemonade",
            Drink::Water => "water",
        }
    }

    /// Parse a drink name; anything unknown means no drink
    pub fn parse(s: &str) -> Option<Drink> {
        match s {
            "cola" => Some(Drink::Cola),
            "lemonade" => Some(Drink::Lemonade),
            "water" => Some(Drink::Water),
            _ => None,
        }
    }
}

/// Cost of the extra cheese add-on, per unit
pub fn extra_cheese_cost() -> Decimal {
    Decimal::new(100, 2) // 1.00
}

/// Cost of a drink add-on, per unit
pub fn drink_cost(drink: Option<Drink>) -> Decimal {
    match drink {
        Some(Drink::Cola) => Decimal::new(250, 2),     // 2.50
        Some(Drink::Lemonade) => Decimal::new(200, 2), // 2.00
        Some(Drink::Water) => Decimal::new(150, 2),    // 1.50
        None => Decimal::ZERO,
    }
}

/// Total add-on cost for one unit of a line item
pub fn modifier_cost(drink: Option<Drink>, extra_cheese: bool) -> Decimal {
    let cheese = if extra_cheese {
        extra_cheese_cost()
    } else {
        Decimal::ZERO
    };
    drink_cost(drink) + cheese
}

/// Price of a full line: `(unit_price + modifiers) * quantity`, rounded to
/// 2 decimal places. Rounding happens per line, before lines are summed.
pub fn line_total(
    unit_price: Decimal,
    drink: Option<Drink>,
    extra_cheese: bool,
    quantity: u32,
) -> Decimal {
    ((unit_price + modifier_cost(drink, extra_cheese)) * Decimal::from(quantity)).round_dp(2)
}

/// Sum of already-rounded line totals
pub fn order_total(line_totals: impl IntoIterator<Item = Decimal>) -> Decimal {
    line_totals.into_iter().sum()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_modifier_table() {
        assert_eq!(drink_cost(Some(Drink::Cola)), dec("2.50"));
        assert_eq!(drink_cost(Some(Drink::Lemonade)), dec("2.00"));
        assert_eq!(drink_cost(Some(Drink::Water)), dec("1.50"));
        assert_eq!(drink_cost(None), Decimal::ZERO);
        assert_eq!(extra_cheese_cost(), dec("1.00"));
    }

    #[test]
    fn test_modifier_cost_combinations() {
        assert_eq!(modifier_cost(None, false), Decimal::ZERO);
        assert_eq!(modifier_cost(None, true), dec("1.00"));
        assert_eq!(modifier_cost(Some(Drink::Cola), false), dec("2.50"));
        assert_eq!(modifier_cost(Some(Drink::Cola), true), dec("3.50"));
    }

    #[test]
    fn test_line_total_worked_example() {
        // (12.99 + 1.00 + 2.50) * 2 = 32.98
        assert_eq!(
            line_total(dec("12.99"), Some(Drink::Cola), true, 2),
            dec("32.98")
        );
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![dec("32.98"), dec("11.99")];
        assert_eq!(order_total(lines), dec("44.97"));
        assert_eq!(order_total(Vec::new()), Decimal::ZERO);
    }

    #[test]
    fn test_line_total_no_modifiers() {
        assert_eq!(line_total(dec("10.99"), None, false, 3), dec("32.97"));
    }
}
