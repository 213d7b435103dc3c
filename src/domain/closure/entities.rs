use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::ClosureError;
use super::value_objects::{ClosureState, ReopenReason};
use crate::domain::document::Document;
use crate::domain::integrity::Fingerprint;

/// Aggregates persisted with a closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosureTotals {
  pub invoice_count: i64,
  pub taxable_base: Decimal,
  pub vat: Decimal,
  pub surcharge: Decimal,
  pub withholding: Decimal,
  pub grand_total: Decimal,
}

impl ClosureTotals {
  pub fn add(&mut self, document: &Document) {
    self.invoice_count += 1;
    self.taxable_base += document.totals.taxable_base;
    self.vat += document.totals.tax_total;
    self.surcharge += document.totals.surcharge_total;
    self.withholding += document.totals.withholding;
    self.grand_total += document.totals.grand_total;
  }

  pub fn from_documents<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
    let mut totals = Self::default();
    for document in documents {
      totals.add(document);
    }
    totals
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reopening {
  pub reason: ReopenReason,
  pub reopened_by: Uuid,
  pub reopened_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportArtifacts {
  pub ledger_path: String,
  pub vat_summary_path: String,
}

// Fiscal closure - never physically deleted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalClosure {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub fiscal_year: i32,
  /// Assigned by storage on insert; zero until then.
  pub sequence: i64,
  pub state: ClosureState,
  pub totals: ClosureTotals,
  pub fingerprint: Fingerprint,
  pub chain_anchor: Option<Fingerprint>,
  pub closed_by: Uuid,
  pub closed_at: DateTime<Utc>,
  pub reopening: Option<Reopening>,
  pub artifacts: Option<ReportArtifacts>,
}

impl FiscalClosure {
  pub fn new(
    tenant_id: Uuid,
    fiscal_year: i32,
    totals: ClosureTotals,
    fingerprint: Fingerprint,
    chain_anchor: Option<Fingerprint>,
    closed_by: Uuid,
  ) -> Self {
    Self {
      id: Uuid::new_v4(),
      tenant_id,
      fiscal_year,
      sequence: 0,
      state: ClosureState::Closed,
      totals,
      fingerprint,
      chain_anchor,
      closed_by,
      closed_at: Utc::now(),
      reopening: None,
      artifacts: None,
    }
  }

  /// Move to `Reopened`. The closure fingerprint and totals are kept.
  pub fn reopen(&mut self, reason: ReopenReason, actor: Uuid) -> Result<(), ClosureError> {
    if self.state != ClosureState::Closed {
      return Err(ClosureError::NotClosed(self.id));
    }
    self.state = ClosureState::Reopened;
    self.reopening = Some(Reopening {
      reason,
      reopened_by: actor,
      reopened_at: Utc::now(),
    });
    Ok(())
  }

  pub fn attach_artifacts(&mut self, artifacts: ReportArtifacts) -> Result<(), ClosureError> {
    if self.artifacts.is_some() {
      return Err(ClosureError::ArtifactsAlreadyAttached(self.id));
    }
    self.artifacts = Some(artifacts);
    Ok(())
  }
}

/// Append-only audit record of a closure state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureTransition {
  pub id: Uuid,
  pub closure_id: Uuid,
  /// `None` when the year was open before the transition.
  pub from_state: Option<ClosureState>,
  pub to_state: ClosureState,
  pub actor: Uuid,
  pub reason: Option<String>,
  pub occurred_at: DateTime<Utc>,
}

impl ClosureTransition {
  pub fn closed(closure: &FiscalClosure) -> Self {
    Self {
      id: Uuid::new_v4(),
      closure_id: closure.id,
      from_state: None,
      to_state: ClosureState::Closed,
      actor: closure.closed_by,
      reason: None,
      occurred_at: closure.closed_at,
    }
  }

  pub fn reopened(closure: &FiscalClosure, reopening: &Reopening) -> Self {
    Self {
      id: Uuid::new_v4(),
      closure_id: closure.id,
      from_state: Some(ClosureState::Closed),
      to_state: ClosureState::Reopened,
      actor: reopening.reopened_by,
      reason: Some(reopening.reason.value().to_string()),
      occurred_at: reopening.reopened_at,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum YearStatus {
  Open,
  Closed,
  Reopened,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterStatistics {
  pub quarter: u32,
  pub sent: i64,
  pub pending: i64,
  pub totals: ClosureTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiscalYearStatistics {
  pub tenant_id: Uuid,
  pub fiscal_year: i32,
  pub quarters: Vec<QuarterStatistics>,
  pub totals: ClosureTotals,
  pub sent: i64,
  pub pending: i64,
  pub can_close: bool,
  pub status: YearStatus,
}

impl FiscalYearStatistics {
  pub fn compute(
    tenant_id: Uuid,
    fiscal_year: i32,
    invoices: &[Document],
    latest_closure: Option<&FiscalClosure>,
  ) -> Self {
    let mut quarters: Vec<QuarterStatistics> = (1..=4)
      .map(|quarter| QuarterStatistics {
        quarter,
        sent: 0,
        pending: 0,
        totals: ClosureTotals::default(),
      })
      .collect();

    for invoice in invoices {
      let stats = &mut quarters[(invoice.quarter() - 1) as usize];
      stats.totals.add(invoice);
      if invoice.is_sent() {
        stats.sent += 1;
      } else {
        stats.pending += 1;
      }
    }

    let totals = ClosureTotals::from_documents(invoices);
    let sent: i64 = quarters.iter().map(|q| q.sent).sum();
    let pending: i64 = quarters.iter().map(|q| q.pending).sum();
    let status = match latest_closure.map(|c| c.state) {
      None => YearStatus::Open,
      Some(ClosureState::Closed) => YearStatus::Closed,
      Some(ClosureState::Reopened) => YearStatus::Reopened,
    };

    Self {
      tenant_id,
      fiscal_year,
      quarters,
      totals,
      sent,
      pending,
      can_close: pending == 0 && totals.invoice_count > 0 && status != YearStatus::Closed,
      status,
    }
  }
}

/// Raw page as returned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosureListing {
  pub items: Vec<FiscalClosure>,
  pub total: u64,
  pub as_of: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosurePage {
  pub items: Vec<FiscalClosure>,
  pub page: u32,
  pub page_size: u32,
  pub total: u64,
  pub total_pages: u32,
  pub as_of: i64,
}

impl ClosurePage {
  pub fn new(listing: ClosureListing, page: u32, page_size: u32) -> Self {
    let total_pages = if listing.total == 0 {
      1
    } else {
      listing.total.div_ceil(u64::from(page_size)) as u32
    };
    Self {
      items: listing.items,
      page,
      page_size,
      total: listing.total,
      total_pages,
      as_of: listing.as_of,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosureDetails {
  pub closure: FiscalClosure,
  pub transitions: Vec<ClosureTransition>,
}
