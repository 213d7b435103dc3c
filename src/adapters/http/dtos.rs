use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::application::documents::DocumentLineInputDto;

/// One line of an invoice or quote as posted by the caller
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentLineRequest {
  #[validate(length(
    min = 1,
    max = 500,
    message = "Line description must be between 1 and 500 characters"
  ))]
  pub description: String,

  pub quantity: Decimal,

  pub unit_price: Decimal,

  /// Discount as a percentage of the gross line amount
  #[serde(default)]
  pub discount_percentage: Option<Decimal>,

  /// Tax catalog code resolved against the issue date
  #[validate(length(min = 1, max = 32, message = "Tax code is required"))]
  pub tax_code: String,
}

impl From<DocumentLineRequest> for DocumentLineInputDto {
  fn from(line: DocumentLineRequest) -> Self {
    DocumentLineInputDto {
      description: line.description,
      quantity: line.quantity,
      unit_price: line.unit_price,
      discount_percentage: line.discount_percentage,
      tax_code: line.tax_code,
    }
  }
}

/// Request to issue a document
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IssueDocumentRequest {
  /// "invoice", "delivery_note" or "quote"
  #[validate(length(min = 1, message = "Document type is required"))]
  pub document_type: String,

  /// Series code; defaults to the type's standard series
  #[serde(default)]
  #[validate(length(min = 1, max = 16, message = "Series code must be 1-16 characters"))]
  pub series_code: Option<String>,

  pub customer_id: Uuid,

  pub issue_date: NaiveDate,

  #[validate(length(min = 1, message = "At least one line is required"), nested)]
  pub lines: Vec<DocumentLineRequest>,

  #[serde(default)]
  pub withholding_percentage: Option<Decimal>,

  /// Invoice being rectified, if any
  #[serde(default)]
  pub rectifies: Option<Uuid>,
}

/// Request to replace the lines of a draft
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDraftRequest {
  #[validate(length(min = 1, message = "At least one line is required"), nested)]
  pub lines: Vec<DocumentLineRequest>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BootstrapSeriesRequest {
  #[validate(range(min = 2000, max = 9999, message = "Fiscal year out of range"))]
  pub fiscal_year: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LockSeriesRequest {
  #[validate(length(min = 1, max = 16, message = "Series code must be 1-16 characters"))]
  pub code: String,

  #[validate(length(min = 1, message = "Document type is required"))]
  pub document_type: String,

  #[validate(range(min = 2000, max = 9999, message = "Fiscal year out of range"))]
  pub fiscal_year: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FiscalYearQuery {
  #[validate(range(min = 2000, max = 9999, message = "Fiscal year out of range"))]
  pub fiscal_year: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CloseFiscalYearRequest {
  #[validate(range(min = 2000, max = 9999, message = "Fiscal year out of range"))]
  pub fiscal_year: i32,
}

/// Blank reasons are rejected by the closure manager as well.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReopenClosureRequest {
  #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
  pub reason: String,
}

/// Closure history query string
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClosureHistoryQuery {
  #[serde(default = "default_page")]
  #[validate(range(min = 1, message = "Page must be at least 1"))]
  pub page: u32,

  #[serde(default = "default_page_size")]
  #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
  pub page_size: u32,

  #[serde(default)]
  pub fiscal_year: Option<i32>,

  /// Snapshot sequence returned by the first page
  #[serde(default)]
  pub as_of: Option<i64>,
}

fn default_page() -> u32 {
  1
}

fn default_page_size() -> u32 {
  20
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type identifier
  pub error: String,

  /// Human-readable error message
  pub message: String,

  /// Optional additional error details
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<serde_json::Value>,
}
