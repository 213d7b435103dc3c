use thiserror::Error;
use uuid::Uuid;

use crate::domain::errors::{ErrorCategory, StorageError, ValueObjectError};

/// Partial unique index allowing one `closed` row per tenant and year.
pub const ONE_CLOSED_PER_YEAR_CONSTRAINT: &str = "fiscal_closures_one_closed_per_year";

#[derive(Debug, Error)]
pub enum ClosureError {
  #[error("Fiscal year {0} is already closed")]
  AlreadyClosed(i32),

  #[error("Fiscal year {fiscal_year} has {pending} invoices pending submission")]
  PendingSubmissions { fiscal_year: i32, pending: usize },

  #[error("Fiscal year {0} has no invoices to close")]
  NothingToClose(i32),

  #[error("Fiscal closure not found: {0}")]
  NotFound(Uuid),

  #[error("Fiscal closure {0} is not closed")]
  NotClosed(Uuid),

  #[error("A reason is required to reopen a fiscal year")]
  ReasonRequired,

  #[error("Report artifacts already attached to closure {0}")]
  ArtifactsAlreadyAttached(Uuid),

  #[error("Invalid page: {0}")]
  InvalidPage(String),

  #[error("Tenant not found: {0}")]
  TenantNotFound(Uuid),

  #[error("Report export failed: {0}")]
  ReportExport(String),

  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),
}

impl ClosureError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      ClosureError::ReasonRequired | ClosureError::InvalidPage(_) | ClosureError::Validation(_) => {
        ErrorCategory::Validation
      }
      ClosureError::NotFound(_) | ClosureError::TenantNotFound(_) => ErrorCategory::NotFound,
      ClosureError::PendingSubmissions { .. } => ErrorCategory::Conflict { retry_later: true },
      ClosureError::AlreadyClosed(_)
      | ClosureError::NothingToClose(_)
      | ClosureError::NotClosed(_)
      | ClosureError::ArtifactsAlreadyAttached(_) => ErrorCategory::Conflict { retry_later: false },
      ClosureError::ReportExport(_) => ErrorCategory::Transient,
      ClosureError::Storage(_) => ErrorCategory::Fatal,
    }
  }
}
