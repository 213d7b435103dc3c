use serde::Serialize;
use thiserror::Error;

/// Errors raised while constructing value objects from raw input.
///
/// These are always validation failures: they are produced before any storage
/// mutation and the caller can fix the input and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
  #[error("Invalid tax ID: {0}")]
  InvalidTaxId(String),
  #[error("Invalid percentage: {0}")]
  InvalidPercentage(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Invalid line description: {0}")]
  InvalidDescription(String),
  #[error("Invalid document number: {0}")]
  InvalidDocumentNumber(String),
  #[error("Invalid document type: {0}")]
  InvalidDocumentType(String),
  #[error("Invalid status: {0}")]
  InvalidStatus(String),
  #[error("Invalid series code: {0}")]
  InvalidSeriesCode(String),
  #[error("Invalid format template: {0}")]
  InvalidFormatTemplate(String),
  #[error("Invalid fiscal year: {0}")]
  InvalidFiscalYear(String),
  #[error("Invalid fingerprint: {0}")]
  InvalidFingerprint(String),
  #[error("Invalid reason: {0}")]
  InvalidReason(String),
}

/// Failures of the durable storage behind a unit of work.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("Database error: {0}")]
  Database(#[source] sqlx::Error),

  #[error("Unique constraint violated: {0}")]
  UniqueViolation(String),

  #[error("Stored record is corrupt: {0}")]
  CorruptRecord(String),

  #[error("Transaction failed: {0}")]
  TransactionFailed(String),
}

impl StorageError {
  pub fn is_unique_violation(&self, constraint: &str) -> bool {
    matches!(self, StorageError::UniqueViolation(name) if name == constraint)
  }
}

impl From<sqlx::Error> for StorageError {
  fn from(error: sqlx::Error) -> Self {
    if let sqlx::Error::Database(db_err) = &error {
      // PostgreSQL unique violation code
      if db_err.code().as_deref() == Some("23505") {
        return StorageError::UniqueViolation(db_err.constraint().unwrap_or("unknown").to_string());
      }
    }
    StorageError::Database(error)
  }
}

impl From<ValueObjectError> for StorageError {
  fn from(error: ValueObjectError) -> Self {
    StorageError::CorruptRecord(error.to_string())
  }
}

/// Coarse classification of every ledger error.
///
/// Callers use it to decide between fixing input, retrying later, escalating
/// to an audit, or failing the request outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ErrorCategory {
  /// Malformed input, rejected before any mutation.
  Validation,
  /// The referenced entity does not exist for this tenant.
  NotFound,
  /// The current state forbids the operation. `retry_later` tells whether the
  /// conflict clears by itself (pending submissions) or needs a data fix.
  Conflict { retry_later: bool },
  /// Chain or fingerprint mismatch. Never auto-corrected.
  Integrity,
  /// Out-of-process I/O failed after retries.
  Transient,
  /// Storage failure or an unexpected condition.
  Fatal,
}
