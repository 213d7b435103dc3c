use chrono::NaiveDate;
use std::sync::Arc;

use super::entities::{TaxRate, TaxRateSnapshot};
use super::errors::TaxError;
use super::ports::TaxRateRepository;

pub struct TaxRuleResolver {
  tax_rate_repo: Arc<dyn TaxRateRepository>,
}

impl TaxRuleResolver {
  pub fn new(tax_rate_repo: Arc<dyn TaxRateRepository>) -> Self {
    Self { tax_rate_repo }
  }

  /// Resolve the percentages of `code` in force on `date`.
  pub async fn resolve(&self, code: &str, date: NaiveDate) -> Result<TaxRateSnapshot, TaxError> {
    let rates = self.tax_rate_repo.find_by_code(code).await?;
    select_rate(&rates, date)
      .map(TaxRate::snapshot)
      .ok_or_else(|| TaxError::TaxRateNotFound {
        code: code.to_string(),
        date,
      })
  }
}

/// Latest `valid_from` wins when validity windows overlap.
pub fn select_rate(rates: &[TaxRate], date: NaiveDate) -> Option<&TaxRate> {
  rates
    .iter()
    .filter(|rate| rate.is_valid_on(date))
    .max_by_key(|rate| rate.valid_from)
}
