use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{DocumentClass, Fingerprint};

/// Integrity data attached to an invoice when it is issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegritySeal {
  pub fingerprint: Fingerprint,
  pub previous_fingerprint: Option<Fingerprint>,
  pub document_class: DocumentClass,
  pub class_code: String,
  pub verification_url: String,
  /// Base64 PNG of the verification QR code.
  pub qr_payload: String,
  /// 1-based position in the tenant's chain.
  pub chain_position: i64,
  pub sealed_at: DateTime<Utc>,
}

// Last link of a tenant's invoice chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainHead {
  pub tenant_id: Uuid,
  pub last_document_id: Option<Uuid>,
  pub last_fingerprint: Option<Fingerprint>,
  pub length: i64,
  pub updated_at: DateTime<Utc>,
}

impl ChainHead {
  pub fn empty(tenant_id: Uuid) -> Self {
    Self {
      tenant_id,
      last_document_id: None,
      last_fingerprint: None,
      length: 0,
      updated_at: Utc::now(),
    }
  }

  pub fn next_position(&self) -> i64 {
    self.length + 1
  }

  pub fn advance(&mut self, document_id: Uuid, fingerprint: Fingerprint) {
    self.last_document_id = Some(document_id);
    self.last_fingerprint = Some(fingerprint);
    self.length += 1;
    self.updated_at = Utc::now();
  }
}

/// QR verification artifacts for one sealed invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationPayload {
  pub url: String,
  pub png: Vec<u8>,
  pub base64: String,
}

/// Record sent to the tax authority.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthoritySubmission {
  pub issuer_tax_id: String,
  pub document_number: String,
  pub issue_date: NaiveDate,
  pub document_class: String,
  pub taxable_base: Decimal,
  pub tax_total: Decimal,
  pub surcharge_total: Decimal,
  pub withholding: Decimal,
  pub grand_total: Decimal,
  pub fingerprint: String,
  pub previous_fingerprint: Option<String>,
  pub chain_position: i64,
  pub rectified_document_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainBreakReason {
  MissingSeal,
  PositionMismatch,
  LinkMismatch,
  FingerprintMismatch,
  AmountsMismatch,
}

impl ChainBreakReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      ChainBreakReason::MissingSeal => "missing_seal",
      ChainBreakReason::PositionMismatch => "position_mismatch",
      ChainBreakReason::LinkMismatch => "link_mismatch",
      ChainBreakReason::FingerprintMismatch => "fingerprint_mismatch",
      ChainBreakReason::AmountsMismatch => "amounts_mismatch",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainBreak {
  /// 1-based position of the first broken link.
  pub position: i64,
  pub document_id: Uuid,
  pub reason: ChainBreakReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
  pub checked: usize,
  pub first_break: Option<ChainBreak>,
}

impl ChainReport {
  pub fn is_valid(&self) -> bool {
    self.first_break.is_none()
  }
}
