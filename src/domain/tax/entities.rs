use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::Percentage;

// Tax rate catalog entry with a validity window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
  pub id: Uuid,
  pub code: String,
  pub vat_percentage: Percentage,
  pub surcharge_percentage: Option<Percentage>,
  pub valid_from: NaiveDate,
  pub valid_to: Option<NaiveDate>,
}

impl TaxRate {
  pub fn new(
    code: impl Into<String>,
    vat_percentage: Percentage,
    surcharge_percentage: Option<Percentage>,
    valid_from: NaiveDate,
    valid_to: Option<NaiveDate>,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      code: code.into(),
      vat_percentage,
      surcharge_percentage,
      valid_from,
      valid_to,
    }
  }

  /// Both bounds are inclusive.
  pub fn is_valid_on(&self, date: NaiveDate) -> bool {
    date >= self.valid_from && self.valid_to.is_none_or(|to| date <= to)
  }

  pub fn snapshot(&self) -> TaxRateSnapshot {
    TaxRateSnapshot {
      tax_rate_id: self.id,
      vat_percentage: self.vat_percentage,
      surcharge_percentage: self.surcharge_percentage,
    }
  }
}

/// Percentages copied onto a document line when it is created.
///
/// A snapshot keeps only a non-owning reference (the id) to the catalog entry
/// it was taken from; later catalog edits never reach persisted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRateSnapshot {
  pub tax_rate_id: Uuid,
  pub vat_percentage: Percentage,
  pub surcharge_percentage: Option<Percentage>,
}

impl TaxRateSnapshot {
  pub fn surcharge_or_zero(&self) -> Percentage {
    self.surcharge_percentage.unwrap_or_default()
  }
}
