//! Monetary breakdown of document lines and documents.
//!
//! Every derived field is rounded to cents on its own, half away from zero,
//! and sums are taken over the rounded line fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{Quantity, UnitPrice, round_money};
use crate::domain::errors::ValueObjectError;
use crate::domain::tax::{Percentage, TaxRateSnapshot};

fn overflow(field: &str) -> ValueObjectError {
  ValueObjectError::InvalidAmount(format!("{} is out of range", field))
}

fn share(percentage: Percentage, amount: Decimal, field: &str) -> Result<Decimal, ValueObjectError> {
  percentage
    .checked_of(amount)
    .map(round_money)
    .ok_or_else(|| overflow(field))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAmounts {
  pub discount_amount: Decimal,
  pub taxable_base: Decimal,
  pub tax_amount: Decimal,
  pub surcharge_amount: Decimal,
  pub line_total: Decimal,
}

impl LineAmounts {
  pub fn compute(
    quantity: Quantity,
    unit_price: UnitPrice,
    discount: Percentage,
    tax: &TaxRateSnapshot,
  ) -> Result<Self, ValueObjectError> {
    let gross = quantity
      .value()
      .checked_mul(unit_price.value())
      .ok_or_else(|| overflow("Line amount"))?;
    let discount_amount = share(discount, gross, "Discount")?;
    let taxable_base = round_money(gross) - discount_amount;
    let tax_amount = share(tax.vat_percentage, taxable_base, "Tax amount")?;
    let surcharge_amount = share(tax.surcharge_or_zero(), taxable_base, "Surcharge")?;
    let line_total = taxable_base
      .checked_add(tax_amount)
      .and_then(|total| total.checked_add(surcharge_amount))
      .ok_or_else(|| overflow("Line total"))?;

    Ok(Self {
      discount_amount,
      taxable_base,
      tax_amount,
      surcharge_amount,
      line_total,
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DocumentTotals {
  pub taxable_base: Decimal,
  pub tax_total: Decimal,
  pub surcharge_total: Decimal,
  pub withholding: Decimal,
  pub grand_total: Decimal,
}

impl DocumentTotals {
  pub fn from_lines<'a>(
    lines: impl IntoIterator<Item = &'a LineAmounts>,
    withholding: Percentage,
  ) -> Result<Self, ValueObjectError> {
    let (taxable_base, tax_total, surcharge_total) = lines.into_iter().try_fold(
      (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
      |(base, tax, surcharge), line| {
        Some((
          base.checked_add(line.taxable_base)?,
          tax.checked_add(line.tax_amount)?,
          surcharge.checked_add(line.surcharge_amount)?,
        ))
      },
    )
    .ok_or_else(|| overflow("Document total"))?;
    let withholding = share(withholding, taxable_base, "Withholding")?;
    let grand_total = taxable_base
      .checked_add(tax_total)
      .and_then(|total| total.checked_add(surcharge_total))
      .and_then(|total| total.checked_sub(withholding))
      .ok_or_else(|| overflow("Grand total"))?;

    Ok(Self {
      taxable_base,
      tax_total,
      surcharge_total,
      withholding,
      grand_total,
    })
  }
}
