use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::ValueObjectError;

// Percentage in [0, 100] with at most 2 decimal places (VAT, surcharge, discount, withholding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percentage(Decimal);

impl Percentage {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
      return Err(ValueObjectError::InvalidPercentage(format!(
        "Percentage must be between 0 and 100, got {}",
        value
      )));
    }
    if value.scale() > 2 {
      return Err(ValueObjectError::InvalidPercentage(
        "Percentage cannot have more than 2 decimal places".to_string(),
      ));
    }
    Ok(Self(value.normalize()))
  }

  pub fn zero() -> Self {
    Self(Decimal::ZERO)
  }

  pub fn value(&self) -> Decimal {
    self.0
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_zero()
  }

  /// Unrounded share of `amount`: amount × percentage / 100.
  pub fn of(&self, amount: Decimal) -> Decimal {
    amount * self.0 / Decimal::ONE_HUNDRED
  }

  /// Like [`Percentage::of`], `None` when the product leaves the decimal range.
  pub fn checked_of(&self, amount: Decimal) -> Option<Decimal> {
    amount.checked_mul(self.0)?.checked_div(Decimal::ONE_HUNDRED)
  }
}

impl Default for Percentage {
  fn default() -> Self {
    Self::zero()
  }
}

impl fmt::Display for Percentage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}%", self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_percentage_bounds() {
    assert!(Percentage::new(dec!(0)).is_ok());
    assert!(Percentage::new(dec!(100)).is_ok());
    assert!(Percentage::new(dec!(5.2)).is_ok());
    assert!(Percentage::new(dec!(-0.01)).is_err());
    assert!(Percentage::new(dec!(100.01)).is_err());
    assert!(Percentage::new(dec!(21.125)).is_err());
  }

  #[test]
  fn test_percentage_of() {
    let vat = Percentage::new(dec!(21)).unwrap();
    assert_eq!(vat.of(dec!(270)), dec!(56.7));
  }

  #[test]
  fn test_percentage_normalizes_trailing_zeros() {
    assert_eq!(
      Percentage::new(dec!(21.00)).unwrap(),
      Percentage::new(dec!(21)).unwrap()
    );
  }
}
