use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use std::fmt;

use crate::domain::closure::ClosureError;
use crate::domain::document::DocumentError;
use crate::domain::errors::ErrorCategory;
use crate::domain::integrity::IntegrityError;
use crate::domain::numbering::NumberingError;
use crate::domain::tax::TaxError;

use super::dtos::ErrorResponse;

/// API error type that maps ledger errors to HTTP responses
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
  /// Validation error (400 Bad Request)
  Validation(String),

  /// Missing tenant-scoped entity (404 Not Found)
  NotFound(String),

  /// State conflict (409 Conflict)
  Conflict { message: String, retry_later: bool },

  /// Integrity violation (422). Details are logged, never returned.
  Integrity(String),

  /// Tax authority or report storage unavailable (503 Service Unavailable)
  Unavailable(String),

  /// Internal server error (500 Internal Server Error)
  Internal(String),
}

impl ApiError {
  /// Map any ledger error through its category.
  pub fn categorized(category: ErrorCategory, error: &impl fmt::Display) -> Self {
    let message = error.to_string();
    match category {
      ErrorCategory::Validation => ApiError::Validation(message),
      ErrorCategory::NotFound => ApiError::NotFound(message),
      ErrorCategory::Conflict { retry_later } => ApiError::Conflict {
        message,
        retry_later,
      },
      ErrorCategory::Integrity => ApiError::Integrity(message),
      ErrorCategory::Transient => ApiError::Unavailable(message),
      ErrorCategory::Fatal => ApiError::Internal(message),
    }
  }
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
      ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
      ApiError::Integrity(msg) => write!(f, "Integrity violation: {}", msg),
      ApiError::Unavailable(msg) => write!(f, "Unavailable: {}", msg),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Conflict { .. } => StatusCode::CONFLICT,
      ApiError::Integrity(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (error_type, message, details) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone(), None),
      ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
      ApiError::Conflict {
        message,
        retry_later,
      } => (
        "conflict",
        message.clone(),
        Some(serde_json::json!({ "retry_later": retry_later })),
      ),
      ApiError::Integrity(msg) => {
        tracing::error!("Integrity violation: {}", msg);
        (
          "document_unavailable",
          "Document not available".to_string(),
          None,
        )
      }
      ApiError::Unavailable(msg) => {
        tracing::warn!("Dependency unavailable: {}", msg);
        ("service_unavailable", msg.clone(), None)
      }
      ApiError::Internal(msg) => {
        // Don't expose internal error details in production
        tracing::error!("Internal error: {}", msg);
        (
          "internal_error",
          "An internal server error occurred".to_string(),
          None,
        )
      }
    };

    let error_response = ErrorResponse {
      error: error_type.to_string(),
      message,
      details,
    };

    HttpResponse::build(status)
      .content_type(ContentType::json())
      .json(error_response)
  }
}

impl From<DocumentError> for ApiError {
  fn from(error: DocumentError) -> Self {
    ApiError::categorized(error.category(), &error)
  }
}

impl From<IntegrityError> for ApiError {
  fn from(error: IntegrityError) -> Self {
    ApiError::categorized(error.category(), &error)
  }
}

impl From<NumberingError> for ApiError {
  fn from(error: NumberingError) -> Self {
    ApiError::categorized(error.category(), &error)
  }
}

impl From<ClosureError> for ApiError {
  fn from(error: ClosureError) -> Self {
    ApiError::categorized(error.category(), &error)
  }
}

impl From<TaxError> for ApiError {
  fn from(error: TaxError) -> Self {
    ApiError::categorized(error.category(), &error)
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let messages: Vec<String> = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors
          .iter()
          .map(|error| {
            error
              .message
              .as_ref()
              .map(|m| m.to_string())
              .unwrap_or_else(|| format!("Invalid field: {}", field))
          })
          .collect::<Vec<_>>()
      })
      .collect();

    if messages.is_empty() {
      return ApiError::Validation(errors.to_string());
    }
    ApiError::Validation(messages.join(", "))
  }
}
