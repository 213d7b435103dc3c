use base64::{Engine as _, engine::general_purpose::STANDARD};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::ValueObjectError;

/// Length of a standard-base64 SHA-256 digest.
pub const FINGERPRINT_LENGTH: usize = 44;

// SHA-256 digest in standard base64
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
  pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
    let value = value.into();
    if value.len() != FINGERPRINT_LENGTH {
      return Err(ValueObjectError::InvalidFingerprint(format!(
        "Fingerprint must be {} characters, got {}",
        FINGERPRINT_LENGTH,
        value.len()
      )));
    }
    match STANDARD.decode(&value) {
      Ok(bytes) if bytes.len() == 32 => Ok(Self(value)),
      _ => Err(ValueObjectError::InvalidFingerprint(
        "Fingerprint is not a base64 SHA-256 digest".to_string(),
      )),
    }
  }

  /// Digest an already canonicalized string.
  pub fn digest(canonical: &str) -> Self {
    Self(STANDARD.encode(Sha256::digest(canonical.as_bytes())))
  }

  pub fn value(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// Document class reported to the tax authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
  Normal,
  Simplified,
  Rectifying,
}

impl DocumentClass {
  pub fn as_str(&self) -> &'static str {
    match self {
      DocumentClass::Normal => "normal",
      DocumentClass::Simplified => "simplified",
      DocumentClass::Rectifying => "rectifying",
    }
  }
}

impl FromStr for DocumentClass {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "normal" => Ok(DocumentClass::Normal),
      "simplified" => Ok(DocumentClass::Simplified),
      "rectifying" => Ok(DocumentClass::Rectifying),
      _ => Err(ValueObjectError::InvalidDocumentType(format!(
        "Unknown document class: {}",
        s
      ))),
    }
  }
}

/// Threshold and authority codes used to classify invoices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationPolicy {
  pub simplified_threshold: Decimal,
  pub normal_code: String,
  pub simplified_code: String,
  pub rectifying_code: String,
}

impl Default for ClassificationPolicy {
  fn default() -> Self {
    Self {
      simplified_threshold: dec!(400.00),
      normal_code: "F1".to_string(),
      simplified_code: "F2".to_string(),
      rectifying_code: "R1".to_string(),
    }
  }
}

impl ClassificationPolicy {
  /// Totals strictly below the threshold are simplified.
  pub fn classify(&self, grand_total: Decimal, rectifying: bool) -> DocumentClass {
    if rectifying {
      DocumentClass::Rectifying
    } else if grand_total < self.simplified_threshold {
      DocumentClass::Simplified
    } else {
      DocumentClass::Normal
    }
  }

  pub fn code_for(&self, class: DocumentClass) -> &str {
    match class {
      DocumentClass::Normal => &self.normal_code,
      DocumentClass::Simplified => &self.simplified_code,
      DocumentClass::Rectifying => &self.rectifying_code,
    }
  }
}
