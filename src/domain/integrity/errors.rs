use thiserror::Error;
use uuid::Uuid;

use super::entities::ChainBreakReason;
use crate::domain::document::LifecycleError;
use crate::domain::errors::{ErrorCategory, StorageError, ValueObjectError};

/// Outcome of one failed call to the tax authority.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorityError {
  /// Network failure, timeout or 5xx. Worth retrying.
  #[error("Authority unavailable: {0}")]
  Transient(String),

  /// 4xx. The authority refused the record; retrying cannot help.
  #[error("Authority rejected the submission ({status}): {detail}")]
  Rejected { status: u16, detail: String },
}

impl AuthorityError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, AuthorityError::Transient(_))
  }
}

#[derive(Debug, Error)]
pub enum IntegrityError {
  #[error("No document given")]
  NullDocument,

  #[error("Document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("Document {0} is not an invoice")]
  NotAnInvoice(Uuid),

  #[error("Invoice {0} has no integrity seal")]
  NotSealed(Uuid),

  #[error("Authority rejected invoice ({status}): {detail}")]
  AuthorityRejected { status: u16, detail: String },

  #[error("Invoice {0} is being submitted by another caller")]
  SubmissionInProgress(Uuid),

  #[error("Submission failed after {attempts} attempts: {last_error}")]
  SubmissionFailed { attempts: u32, last_error: String },

  #[error("Chain broken at position {position} (document {document_id}): {}", .reason.as_str())]
  ChainBroken {
    position: i64,
    document_id: Uuid,
    reason: ChainBreakReason,
  },

  #[error("QR rendering failed: {0}")]
  QrRendering(String),

  #[error(transparent)]
  Lifecycle(#[from] LifecycleError),

  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),
}

impl IntegrityError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      IntegrityError::NullDocument | IntegrityError::Validation(_) => ErrorCategory::Validation,
      IntegrityError::DocumentNotFound(_) => ErrorCategory::NotFound,
      IntegrityError::NotAnInvoice(_)
      | IntegrityError::NotSealed(_)
      | IntegrityError::AuthorityRejected { .. }
      | IntegrityError::Lifecycle(_) => ErrorCategory::Conflict { retry_later: false },
      IntegrityError::SubmissionInProgress(_) => ErrorCategory::Conflict { retry_later: true },
      IntegrityError::SubmissionFailed { .. } => ErrorCategory::Transient,
      IntegrityError::ChainBroken { .. } => ErrorCategory::Integrity,
      IntegrityError::QrRendering(_) | IntegrityError::Storage(_) => ErrorCategory::Fatal,
    }
  }
}
