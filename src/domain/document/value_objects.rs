use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::ValueObjectError;

/// Round a monetary amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

// Document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
  Invoice,
  DeliveryNote,
  Quote,
}

impl DocumentType {
  pub const ALL: [DocumentType; 3] = [
    DocumentType::Invoice,
    DocumentType::DeliveryNote,
    DocumentType::Quote,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      DocumentType::Invoice => "invoice",
      DocumentType::DeliveryNote => "delivery_note",
      DocumentType::Quote => "quote",
    }
  }

  /// Code of the series created for this type by the default bootstrap.
  pub fn default_series_code(&self) -> &'static str {
    match self {
      DocumentType::Invoice => "F",
      DocumentType::DeliveryNote => "A",
      DocumentType::Quote => "P",
    }
  }

  pub fn is_invoice(&self) -> bool {
    matches!(self, DocumentType::Invoice)
  }
}

impl FromStr for DocumentType {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "invoice" => Ok(DocumentType::Invoice),
      "delivery_note" => Ok(DocumentType::DeliveryNote),
      "quote" => Ok(DocumentType::Quote),
      _ => Err(ValueObjectError::InvalidDocumentType(format!(
        "Unknown document type: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for DocumentType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// Document status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
  Draft,
  Computed,
  /// Claimed by one submitter while the authority call is in flight.
  Submitting,
  Submitted,
  SubmissionFailed,
  /// Refused by the authority (4xx); left out of automatic resubmission.
  Rejected,
}

impl DocumentStatus {
  pub fn can_transition_to(&self, new_status: DocumentStatus) -> bool {
    match (self, new_status) {
      // Sealing computes the integrity data
      (DocumentStatus::Draft, DocumentStatus::Computed) => true,
      // Any unsent invoice can be claimed; a stale claim can be taken over
      (
        DocumentStatus::Computed
        | DocumentStatus::SubmissionFailed
        | DocumentStatus::Rejected
        | DocumentStatus::Submitting,
        DocumentStatus::Submitting,
      ) => true,
      (
        DocumentStatus::Submitting,
        DocumentStatus::Submitted | DocumentStatus::SubmissionFailed | DocumentStatus::Rejected,
      ) => true,
      _ => false,
    }
  }

  /// Sealed, unsent and eligible for automatic resubmission.
  pub fn is_pending_submission(&self) -> bool {
    matches!(
      self,
      DocumentStatus::Computed | DocumentStatus::SubmissionFailed
    )
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      DocumentStatus::Draft => "draft",
      DocumentStatus::Computed => "computed",
      DocumentStatus::Submitting => "submitting",
      DocumentStatus::Submitted => "submitted",
      DocumentStatus::SubmissionFailed => "submission_failed",
      DocumentStatus::Rejected => "rejected",
    }
  }
}

impl FromStr for DocumentStatus {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "draft" => Ok(DocumentStatus::Draft),
      "computed" => Ok(DocumentStatus::Computed),
      "submitting" => Ok(DocumentStatus::Submitting),
      "submitted" => Ok(DocumentStatus::Submitted),
      "submission_failed" => Ok(DocumentStatus::SubmissionFailed),
      "rejected" => Ok(DocumentStatus::Rejected),
      _ => Err(ValueObjectError::InvalidStatus(format!(
        "Unknown document status: {}",
        s
      ))),
    }
  }
}

impl fmt::Display for DocumentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Exclusive upper bound of quantities and unit prices (`NUMERIC(14,4)`).
pub const MAX_LINE_VALUE: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

// Quantity (minimum 0.01)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity(Decimal);

impl Quantity {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::new(1, 2) {
      return Err(ValueObjectError::InvalidQuantity(format!(
        "Quantity must be at least 0.01, got {}",
        value
      )));
    }
    if value >= MAX_LINE_VALUE {
      return Err(ValueObjectError::InvalidQuantity(format!(
        "Quantity must be below {}, got {}",
        MAX_LINE_VALUE, value
      )));
    }
    if value.scale() > 4 {
      return Err(ValueObjectError::InvalidQuantity(
        "Quantity cannot have more than 4 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

// Unit price (non-negative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPrice(Decimal);

impl UnitPrice {
  pub fn new(value: Decimal) -> Result<Self, ValueObjectError> {
    if value < Decimal::ZERO {
      return Err(ValueObjectError::InvalidAmount(format!(
        "Unit price cannot be negative, got {}",
        value
      )));
    }
    if value >= MAX_LINE_VALUE {
      return Err(ValueObjectError::InvalidAmount(format!(
        "Unit price must be below {}, got {}",
        MAX_LINE_VALUE, value
      )));
    }
    if value.scale() > 4 {
      return Err(ValueObjectError::InvalidAmount(
        "Unit price cannot have more than 4 decimal places".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> Decimal {
    self.0
  }
}

// Line description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDescription(String);

impl LineDescription {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot be empty".to_string(),
      ));
    }
    if trimmed.chars().count() > 500 {
      return Err(ValueObjectError::InvalidDescription(
        "Description cannot exceed 500 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

// Rendered document number, e.g. F-00001/2024
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber(String);

impl DocumentNumber {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    if value.trim().is_empty() {
      return Err(ValueObjectError::InvalidDocumentNumber(
        "Document number cannot be empty".to_string(),
      ));
    }
    if value.len() > 60 {
      return Err(ValueObjectError::InvalidDocumentNumber(
        "Document number cannot exceed 60 characters".to_string(),
      ));
    }
    Ok(Self(value))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for DocumentNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_round_money_half_away_from_zero() {
    assert_eq!(round_money(dec!(0.005)), dec!(0.01));
    assert_eq!(round_money(dec!(0.004)), dec!(0.00));
    assert_eq!(round_money(dec!(-0.005)), dec!(-0.01));
    assert_eq!(round_money(dec!(56.7)), dec!(56.70));
  }

  #[test]
  fn test_document_status_transitions() {
    assert!(DocumentStatus::Draft.can_transition_to(DocumentStatus::Computed));
    assert!(DocumentStatus::Computed.can_transition_to(DocumentStatus::Submitting));
    assert!(DocumentStatus::SubmissionFailed.can_transition_to(DocumentStatus::Submitting));
    assert!(DocumentStatus::Rejected.can_transition_to(DocumentStatus::Submitting));
    assert!(DocumentStatus::Submitting.can_transition_to(DocumentStatus::Submitted));
    assert!(DocumentStatus::Submitting.can_transition_to(DocumentStatus::Rejected));

    // Outcomes are only recorded against a claim
    assert!(!DocumentStatus::Computed.can_transition_to(DocumentStatus::Submitted));
    assert!(!DocumentStatus::SubmissionFailed.can_transition_to(DocumentStatus::Submitted));
    assert!(!DocumentStatus::Draft.can_transition_to(DocumentStatus::Submitting));
    assert!(!DocumentStatus::Submitted.can_transition_to(DocumentStatus::Submitting));
    assert!(!DocumentStatus::Submitted.can_transition_to(DocumentStatus::Draft));
  }

  #[test]
  fn test_rejected_and_claimed_invoices_are_not_swept() {
    assert!(DocumentStatus::Computed.is_pending_submission());
    assert!(DocumentStatus::SubmissionFailed.is_pending_submission());
    assert!(!DocumentStatus::Rejected.is_pending_submission());
    assert!(!DocumentStatus::Submitting.is_pending_submission());
    assert_eq!(
      DocumentStatus::from_str("rejected").unwrap(),
      DocumentStatus::Rejected
    );
  }

  #[test]
  fn test_document_type_parsing() {
    assert_eq!(DocumentType::from_str("Invoice").unwrap(), DocumentType::Invoice);
    assert_eq!(
      DocumentType::from_str("delivery_note").unwrap(),
      DocumentType::DeliveryNote
    );
    assert!(DocumentType::from_str("receipt").is_err());
    assert_eq!(DocumentType::Quote.default_series_code(), "P");
  }

  #[test]
  fn test_quantity_minimum() {
    assert!(Quantity::new(dec!(0.01)).is_ok());
    assert!(Quantity::new(dec!(0.009)).is_err());
    assert!(Quantity::new(dec!(0)).is_err());
  }

  #[test]
  fn test_line_values_capped_at_column_range() {
    assert_eq!(MAX_LINE_VALUE, dec!(10000000000));
    assert!(Quantity::new(dec!(9999999999.9999)).is_ok());
    assert!(Quantity::new(dec!(10000000000)).is_err());
    assert!(UnitPrice::new(dec!(9999999999.9999)).is_ok());
    assert!(matches!(
      UnitPrice::new(dec!(100000000000000000000)),
      Err(ValueObjectError::InvalidAmount(_))
    ));
  }

  #[test]
  fn test_unit_price_allows_zero() {
    assert!(UnitPrice::new(dec!(0)).is_ok());
    assert!(UnitPrice::new(dec!(-1)).is_err());
  }

  #[test]
  fn test_line_description_trimmed() {
    assert_eq!(LineDescription::new("  Consulting ").unwrap().value(), "Consulting");
    assert!(LineDescription::new("   ").is_err());
  }
}
