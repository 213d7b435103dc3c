use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::errors::{ErrorCategory, StorageError, ValueObjectError};

#[derive(Debug, Error)]
pub enum TaxError {
  #[error("No tax rate '{code}' valid on {date}")]
  TaxRateNotFound { code: String, date: NaiveDate },

  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),
}

impl TaxError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      TaxError::TaxRateNotFound { .. } | TaxError::Validation(_) => ErrorCategory::Validation,
      TaxError::Storage(_) => ErrorCategory::Fatal,
    }
  }
}
