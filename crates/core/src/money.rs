use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A check amount as read, at full precision. Shown rounded to cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal)
    }

    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Rounded to cents, half away from zero.
    pub fn to_cents(self) -> Decimal {
        self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money::from_decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_cents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_cents() {
        let m = Money::from_decimal(Decimal::from_str("12.345").unwrap());
        assert_eq!(m.to_string(), "12.35");
    }

    #[test]
    fn zero_detection() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_str("0.00").unwrap().is_zero());
        assert!(!Money::from_str("0.01").unwrap().is_zero());
    }

    #[test]
    fn sub_cent_amount_is_not_zero() {
        let m = Money::from_str("0.004").unwrap();
        assert!(!m.is_zero());
        assert_eq!(m.to_string(), "0.00");
        assert_eq!(m.as_decimal(), Decimal::from_str("0.004").unwrap());
    }

    #[test]
    fn parse_stored_text() {
        assert_eq!(Money::from_str(" 150.5 ").unwrap().to_string(), "150.50");
        assert!(Money::from_str("abc").is_err());
    }
}
