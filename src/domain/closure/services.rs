use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::entities::{
  ClosureDetails, ClosurePage, ClosureTotals, ClosureTransition, FiscalClosure,
  FiscalYearStatistics, ReportArtifacts,
};
use super::errors::{ClosureError, ONE_CLOSED_PER_YEAR_CONSTRAINT};
use super::ports::{ClosureStore, ReportExporter};
use super::value_objects::{ClosureState, HistoryQuery, ReopenReason};
use crate::domain::document::{Document, DocumentStore, DocumentType};
use crate::domain::integrity::{ChainStore, Fingerprint};
use crate::domain::numbering::SeriesStore;
use crate::domain::tenant::TenantStore;
use crate::domain::unit_of_work::LedgerStore;

/// Fingerprint binding a closure's aggregates to the tenant's chain head.
pub fn compute_closure_fingerprint(
  tenant_id: Uuid,
  fiscal_year: i32,
  totals: &ClosureTotals,
  chain_anchor: Option<&Fingerprint>,
) -> Fingerprint {
  Fingerprint::digest(&format!(
    "tenant={}&year={}&invoices={}&base={:.2}&vat={:.2}&surcharge={:.2}&withholding={:.2}&total={:.2}&chain={}",
    tenant_id,
    fiscal_year,
    totals.invoice_count,
    totals.taxable_base,
    totals.vat,
    totals.surcharge,
    totals.withholding,
    totals.grand_total,
    chain_anchor.map(Fingerprint::value).unwrap_or_default(),
  ))
}

pub struct FiscalClosureManager {
  store: Arc<dyn LedgerStore>,
  exporter: Arc<dyn ReportExporter>,
}

impl FiscalClosureManager {
  pub fn new(store: Arc<dyn LedgerStore>, exporter: Arc<dyn ReportExporter>) -> Self {
    Self { store, exporter }
  }

  pub async fn get_statistics(
    &self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<FiscalYearStatistics, ClosureError> {
    let mut tx = self.store.begin().await?;
    tx.find_tenant(tenant_id)
      .await?
      .ok_or(ClosureError::TenantNotFound(tenant_id))?;
    let invoices = tx
      .documents_for_year(tenant_id, fiscal_year, Some(DocumentType::Invoice))
      .await?;
    let latest = tx.latest_closure_for_year(tenant_id, fiscal_year).await?;

    Ok(FiscalYearStatistics::compute(
      tenant_id,
      fiscal_year,
      &invoices,
      latest.as_ref(),
    ))
  }

  /// Close a fiscal year.
  ///
  /// Every series of the year and the chain head are locked for the whole
  /// unit of work, so no document can be issued while the closure is built.
  /// Report export runs after commit; its failure does not undo the closure.
  #[instrument(skip(self))]
  pub async fn close(
    &self,
    tenant_id: Uuid,
    fiscal_year: i32,
    actor: Uuid,
  ) -> Result<FiscalClosure, ClosureError> {
    let mut tx = self.store.begin().await?;
    tx.find_tenant(tenant_id)
      .await?
      .ok_or(ClosureError::TenantNotFound(tenant_id))?;
    tx.lock_series_for_year(tenant_id, fiscal_year).await?;
    let chain_head = tx.lock_chain_head(tenant_id).await?;

    if tx
      .latest_closure_for_year(tenant_id, fiscal_year)
      .await?
      .is_some_and(|closure| closure.state == ClosureState::Closed)
    {
      return Err(ClosureError::AlreadyClosed(fiscal_year));
    }

    let invoices = tx
      .documents_for_year(tenant_id, fiscal_year, Some(DocumentType::Invoice))
      .await?;
    let pending = invoices.iter().filter(|invoice| !invoice.is_sent()).count();
    if pending > 0 {
      return Err(ClosureError::PendingSubmissions {
        fiscal_year,
        pending,
      });
    }
    if invoices.is_empty() {
      return Err(ClosureError::NothingToClose(fiscal_year));
    }

    let totals = ClosureTotals::from_documents(&invoices);
    let chain_anchor = chain_head.and_then(|head| head.last_fingerprint);
    let fingerprint =
      compute_closure_fingerprint(tenant_id, fiscal_year, &totals, chain_anchor.as_ref());

    let closure = FiscalClosure::new(
      tenant_id,
      fiscal_year,
      totals,
      fingerprint,
      chain_anchor,
      actor,
    );
    let closure = tx.insert_closure(&closure).await.map_err(|err| {
      if err.is_unique_violation(ONE_CLOSED_PER_YEAR_CONSTRAINT) {
        ClosureError::AlreadyClosed(fiscal_year)
      } else {
        ClosureError::Storage(err)
      }
    })?;
    let frozen = tx.freeze_year(tenant_id, fiscal_year, closure.id).await?;
    tx.insert_transition(&ClosureTransition::closed(&closure))
      .await?;
    tx.commit().await?;

    info!(
      closure_id = %closure.id,
      sequence = closure.sequence,
      invoices = closure.totals.invoice_count,
      frozen_documents = frozen,
      grand_total = %closure.totals.grand_total,
      "Fiscal year closed"
    );

    Ok(self.export_reports(closure, &invoices).await)
  }

  async fn export_reports(&self, closure: FiscalClosure, invoices: &[Document]) -> FiscalClosure {
    let artifacts = match self.exporter.export(&closure, invoices).await {
      Ok(artifacts) => artifacts,
      Err(err) => {
        warn!(closure_id = %closure.id, error = %err, "Closure report export failed");
        return closure;
      }
    };

    match self.attach_artifacts(closure.tenant_id, closure.id, artifacts).await {
      Ok(updated) => updated,
      Err(err) => {
        warn!(closure_id = %closure.id, error = %err, "Could not attach closure reports");
        closure
      }
    }
  }

  async fn attach_artifacts(
    &self,
    tenant_id: Uuid,
    closure_id: Uuid,
    artifacts: ReportArtifacts,
  ) -> Result<FiscalClosure, ClosureError> {
    let mut tx = self.store.begin().await?;
    let mut closure = tx
      .find_closure(tenant_id, closure_id)
      .await?
      .ok_or(ClosureError::NotFound(closure_id))?;
    closure.attach_artifacts(artifacts)?;
    tx.update_closure(&closure).await?;
    tx.commit().await?;
    Ok(closure)
  }

  /// Reopen a closed year. The reason is validated before any storage access.
  #[instrument(skip(self, reason))]
  pub async fn reopen(
    &self,
    tenant_id: Uuid,
    closure_id: Uuid,
    reason: &str,
    actor: Uuid,
  ) -> Result<FiscalClosure, ClosureError> {
    if reason.trim().is_empty() {
      return Err(ClosureError::ReasonRequired);
    }
    let reason = ReopenReason::new(reason)?;

    let mut tx = self.store.begin().await?;
    let mut closure = tx
      .find_closure(tenant_id, closure_id)
      .await?
      .ok_or(ClosureError::NotFound(closure_id))?;
    closure.reopen(reason, actor)?;

    let transition = match closure.reopening.as_ref() {
      Some(reopening) => ClosureTransition::reopened(&closure, reopening),
      None => return Err(ClosureError::NotClosed(closure_id)),
    };

    tx.update_closure(&closure).await?;
    let unfrozen = tx.unfreeze_closure(closure.id).await?;
    tx.insert_transition(&transition).await?;
    tx.commit().await?;

    info!(
      closure_id = %closure.id,
      fiscal_year = closure.fiscal_year,
      unfrozen_documents = unfrozen,
      "Fiscal year reopened"
    );

    Ok(closure)
  }

  pub async fn get_history(
    &self,
    tenant_id: Uuid,
    query: HistoryQuery,
  ) -> Result<ClosurePage, ClosureError> {
    let mut tx = self.store.begin().await?;
    let listing = tx.list_closures(tenant_id, &query).await?;
    Ok(ClosurePage::new(listing, query.page, query.page_size))
  }

  pub async fn get_closure(
    &self,
    tenant_id: Uuid,
    closure_id: Uuid,
  ) -> Result<ClosureDetails, ClosureError> {
    let mut tx = self.store.begin().await?;
    let closure = tx
      .find_closure(tenant_id, closure_id)
      .await?
      .ok_or(ClosureError::NotFound(closure_id))?;
    let transitions = tx.transitions_for(closure_id).await?;
    Ok(ClosureDetails {
      closure,
      transitions,
    })
  }
}
