use thiserror::Error;
use uuid::Uuid;

use super::value_objects::DocumentStatus;
use crate::domain::errors::{ErrorCategory, StorageError, ValueObjectError};
use crate::domain::integrity::IntegrityError;
use crate::domain::numbering::NumberingError;
use crate::domain::tax::TaxError;

/// State-machine violations raised by the document entity itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
  #[error("Invalid status transition from {from} to {to}")]
  InvalidTransition {
    from: DocumentStatus,
    to: DocumentStatus,
  },

  #[error("Document already carries an integrity seal")]
  AlreadySealed,

  #[error("Only invoices can be sealed")]
  NotAnInvoice,

  #[error("Document is frozen by fiscal closure {0}")]
  Frozen(Uuid),

  #[error("Document can no longer be edited")]
  NotEditable,
}

#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("A document needs at least one line")]
  NoLines,

  #[error("Only invoices can rectify another invoice")]
  RectificationNotAllowed,

  #[error("Rectified invoice not found: {0}")]
  RectifiedInvoiceNotFound(Uuid),

  #[error("Document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("Tenant not found: {0}")]
  TenantNotFound(Uuid),

  #[error("Fiscal year {0} is closed")]
  FiscalYearClosed(i32),

  #[error("Document number already exists for this tenant")]
  DuplicateNumber,

  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  #[error(transparent)]
  Tax(#[from] TaxError),

  #[error(transparent)]
  Numbering(#[from] NumberingError),

  #[error(transparent)]
  Integrity(#[from] IntegrityError),

  #[error("Storage error: {0}")]
  Storage(StorageError),
}

impl From<StorageError> for DocumentError {
  fn from(error: StorageError) -> Self {
    match error {
      StorageError::UniqueViolation(constraint) if constraint == "documents_tenant_number_unique" => {
        DocumentError::DuplicateNumber
      }
      other => DocumentError::Storage(other),
    }
  }
}

impl DocumentError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      DocumentError::Validation(_)
      | DocumentError::NoLines
      | DocumentError::RectificationNotAllowed => ErrorCategory::Validation,
      DocumentError::RectifiedInvoiceNotFound(_)
      | DocumentError::DocumentNotFound(_)
      | DocumentError::TenantNotFound(_) => ErrorCategory::NotFound,
      DocumentError::FiscalYearClosed(_) | DocumentError::Lifecycle(_) => {
        ErrorCategory::Conflict { retry_later: false }
      }
      DocumentError::DuplicateNumber => ErrorCategory::Integrity,
      DocumentError::Tax(error) => error.category(),
      DocumentError::Numbering(error) => error.category(),
      DocumentError::Integrity(error) => error.category(),
      DocumentError::Storage(_) => ErrorCategory::Fatal,
    }
  }
}
