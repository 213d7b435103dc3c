use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calculator::{DocumentTotals, LineAmounts};
use super::errors::{DocumentError, LifecycleError};
use super::value_objects::{
  DocumentNumber, DocumentStatus, DocumentType, LineDescription, Quantity, UnitPrice,
};
use crate::domain::errors::ValueObjectError;
use crate::domain::integrity::IntegritySeal;
use crate::domain::tax::{Percentage, TaxRateSnapshot};
use crate::domain::tenant::TaxId;

/// Line input after tax resolution, before it belongs to a document.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
  pub description: LineDescription,
  pub quantity: Quantity,
  pub unit_price: UnitPrice,
  pub discount: Percentage,
  pub tax: TaxRateSnapshot,
}

// Document line (owned by a document, back-referenced by id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
  pub id: Uuid,
  pub document_id: Uuid,
  pub line_order: i32,
  pub description: LineDescription,
  pub quantity: Quantity,
  pub unit_price: UnitPrice,
  pub discount: Percentage,
  pub tax: TaxRateSnapshot,
  pub amounts: LineAmounts,
}

impl DocumentLine {
  pub fn new(
    document_id: Uuid,
    line_order: i32,
    line: PricedLine,
  ) -> Result<Self, ValueObjectError> {
    let amounts = LineAmounts::compute(line.quantity, line.unit_price, line.discount, &line.tax)?;
    Ok(Self {
      id: Uuid::new_v4(),
      document_id,
      line_order,
      description: line.description,
      quantity: line.quantity,
      unit_price: line.unit_price,
      discount: line.discount,
      tax: line.tax,
      amounts,
    })
  }

  /// Stored amounts are a cache; this recomputes them from the inputs.
  pub fn recompute(&self) -> Result<LineAmounts, ValueObjectError> {
    LineAmounts::compute(self.quantity, self.unit_price, self.discount, &self.tax)
  }
}

/// Identity of a document as decided inside the issuing unit of work.
#[derive(Debug, Clone)]
pub struct DocumentHeader {
  pub tenant_id: Uuid,
  pub series_id: Uuid,
  pub customer_id: Uuid,
  pub document_type: DocumentType,
  pub sequence_number: i64,
  pub number: DocumentNumber,
  pub issuer_tax_id: TaxId,
  pub issue_date: NaiveDate,
  pub rectifies: Option<Uuid>,
}

// Document - invoice, delivery note or quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub series_id: Uuid,
  pub customer_id: Uuid,
  pub document_type: DocumentType,
  pub fiscal_year: i32,
  pub sequence_number: i64,
  pub number: DocumentNumber,
  pub issuer_tax_id: TaxId,
  pub issue_date: NaiveDate,
  pub lines: Vec<DocumentLine>,
  pub withholding_percentage: Percentage,
  pub totals: DocumentTotals,
  pub status: DocumentStatus,
  pub rectifies: Option<Uuid>,
  pub seal: Option<IntegritySeal>,
  pub sent_at: Option<DateTime<Utc>>,
  pub last_submission_error: Option<String>,
  pub submission_attempts: i32,
  pub frozen_by: Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Document {
  pub fn new(
    header: DocumentHeader,
    lines: Vec<PricedLine>,
    withholding_percentage: Percentage,
  ) -> Result<Self, DocumentError> {
    if lines.is_empty() {
      return Err(DocumentError::NoLines);
    }
    if header.rectifies.is_some() && !header.document_type.is_invoice() {
      return Err(DocumentError::RectificationNotAllowed);
    }

    let id = Uuid::new_v4();
    let lines = build_lines(id, lines)?;
    let totals =
      DocumentTotals::from_lines(lines.iter().map(|l| &l.amounts), withholding_percentage)?;
    let now = Utc::now();

    Ok(Self {
      id,
      tenant_id: header.tenant_id,
      series_id: header.series_id,
      customer_id: header.customer_id,
      document_type: header.document_type,
      fiscal_year: header.issue_date.year(),
      sequence_number: header.sequence_number,
      number: header.number,
      issuer_tax_id: header.issuer_tax_id,
      issue_date: header.issue_date,
      lines,
      withholding_percentage,
      totals,
      status: DocumentStatus::Draft,
      rectifies: header.rectifies,
      seal: None,
      sent_at: None,
      last_submission_error: None,
      submission_attempts: 0,
      frozen_by: None,
      created_at: now,
      updated_at: now,
    })
  }

  pub fn is_invoice(&self) -> bool {
    self.document_type.is_invoice()
  }

  pub fn is_rectifying(&self) -> bool {
    self.rectifies.is_some()
  }

  pub fn is_sealed(&self) -> bool {
    self.seal.is_some()
  }

  pub fn is_sent(&self) -> bool {
    self.sent_at.is_some()
  }

  /// Drafts that are neither sealed nor frozen by a closure.
  pub fn is_editable(&self) -> bool {
    self.status == DocumentStatus::Draft && self.seal.is_none() && self.frozen_by.is_none()
  }

  /// Calendar quarter (1-4) of the issue date.
  pub fn quarter(&self) -> u32 {
    (self.issue_date.month() - 1) / 3 + 1
  }

  fn ensure_editable(&self) -> Result<(), LifecycleError> {
    if let Some(closure_id) = self.frozen_by {
      return Err(LifecycleError::Frozen(closure_id));
    }
    if !self.is_editable() {
      return Err(LifecycleError::NotEditable);
    }
    Ok(())
  }

  pub fn ensure_deletable(&self) -> Result<(), LifecycleError> {
    self.ensure_editable()
  }

  pub fn replace_lines(&mut self, lines: Vec<PricedLine>) -> Result<(), DocumentError> {
    self.ensure_editable()?;
    if lines.is_empty() {
      return Err(DocumentError::NoLines);
    }
    let lines = build_lines(self.id, lines)?;
    self.totals =
      DocumentTotals::from_lines(lines.iter().map(|l| &l.amounts), self.withholding_percentage)?;
    self.lines = lines;
    self.updated_at = Utc::now();
    Ok(())
  }

  /// Attach the integrity seal. A seal is assigned once and never replaced.
  pub fn seal(&mut self, seal: IntegritySeal) -> Result<(), LifecycleError> {
    if !self.is_invoice() {
      return Err(LifecycleError::NotAnInvoice);
    }
    if self.seal.is_some() {
      return Err(LifecycleError::AlreadySealed);
    }
    self.transition_to(DocumentStatus::Computed)?;
    self.seal = Some(seal);
    Ok(())
  }

  /// Whether another submitter holds a claim taken at or after `stale_before`.
  pub fn has_live_claim(&self, stale_before: DateTime<Utc>) -> bool {
    self.status == DocumentStatus::Submitting && self.updated_at >= stale_before
  }

  /// Sealed, unsent invoices the resubmission sweep should pick up.
  pub fn awaits_resubmission(&self, stale_before: DateTime<Utc>) -> bool {
    self.is_invoice()
      && (self.status.is_pending_submission()
        || (self.status == DocumentStatus::Submitting && self.updated_at < stale_before))
  }

  /// Claim the invoice for one authority call. The claim time is `updated_at`.
  pub fn begin_submission(&mut self) -> Result<(), LifecycleError> {
    self.transition_to(DocumentStatus::Submitting)
  }

  pub fn mark_submitted(&mut self, at: DateTime<Utc>, attempts: u32) -> Result<(), LifecycleError> {
    self.transition_to(DocumentStatus::Submitted)?;
    self.sent_at = Some(at);
    self.last_submission_error = None;
    self.submission_attempts += attempts as i32;
    Ok(())
  }

  pub fn mark_submission_failed(
    &mut self,
    error: impl Into<String>,
    attempts: u32,
  ) -> Result<(), LifecycleError> {
    self.transition_to(DocumentStatus::SubmissionFailed)?;
    self.last_submission_error = Some(error.into());
    self.submission_attempts += attempts as i32;
    Ok(())
  }

  /// Record a permanent refusal together with the authority's detail.
  pub fn mark_rejected(&mut self, detail: impl Into<String>, attempts: u32) -> Result<(), LifecycleError> {
    self.transition_to(DocumentStatus::Rejected)?;
    self.last_submission_error = Some(detail.into());
    self.submission_attempts += attempts as i32;
    Ok(())
  }

  pub fn freeze(&mut self, closure_id: Uuid) {
    self.frozen_by = Some(closure_id);
    self.updated_at = Utc::now();
  }

  pub fn unfreeze(&mut self) {
    self.frozen_by = None;
    self.updated_at = Utc::now();
  }

  /// Whether stored line amounts and totals still match their inputs.
  pub fn amounts_consistent(&self) -> bool {
    let Ok(recomputed) = self
      .lines
      .iter()
      .map(DocumentLine::recompute)
      .collect::<Result<Vec<LineAmounts>, _>>()
    else {
      return false;
    };
    let lines_match = self
      .lines
      .iter()
      .zip(&recomputed)
      .all(|(line, amounts)| line.amounts == *amounts);

    lines_match
      && DocumentTotals::from_lines(&recomputed, self.withholding_percentage)
        .is_ok_and(|totals| totals == self.totals)
  }

  fn transition_to(&mut self, status: DocumentStatus) -> Result<(), LifecycleError> {
    if !self.status.can_transition_to(status) {
      return Err(LifecycleError::InvalidTransition {
        from: self.status,
        to: status,
      });
    }
    self.status = status;
    self.updated_at = Utc::now();
    Ok(())
  }
}

fn build_lines(
  document_id: Uuid,
  lines: Vec<PricedLine>,
) -> Result<Vec<DocumentLine>, ValueObjectError> {
  lines
    .into_iter()
    .enumerate()
    .map(|(index, line)| DocumentLine::new(document_id, index as i32 + 1, line))
    .collect()
}
