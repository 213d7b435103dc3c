use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::{ErrorCategory, StorageError, ValueObjectError};

#[derive(Debug, Error)]
pub enum NumberingError {
  #[error("No active numbering series '{0}'")]
  SeriesNotFound(String),

  #[error("Numbering series '{0}' is locked")]
  SeriesLocked(String),

  #[error("Numbering series '{0}' exhausted its counter")]
  CounterOverflow(String),

  #[error("Tenant not found: {0}")]
  TenantNotFound(Uuid),

  #[error("Tenant {0} has not finished provisioning")]
  TenantNotProvisioned(Uuid),

  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),
}

impl NumberingError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      NumberingError::Validation(_) => ErrorCategory::Validation,
      NumberingError::SeriesNotFound(_) | NumberingError::TenantNotFound(_) => {
        ErrorCategory::NotFound
      }
      NumberingError::SeriesLocked(_) | NumberingError::CounterOverflow(_) => {
        ErrorCategory::Conflict { retry_later: false }
      }
      NumberingError::TenantNotProvisioned(_) => ErrorCategory::Conflict { retry_later: true },
      NumberingError::Storage(_) => ErrorCategory::Fatal,
    }
  }
}
