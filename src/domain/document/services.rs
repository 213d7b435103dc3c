use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::entities::{Document, DocumentHeader, PricedLine};
use super::errors::DocumentError;
use super::value_objects::{DocumentNumber, DocumentType, LineDescription, Quantity, UnitPrice};
use crate::domain::closure::ClosureState;
use crate::domain::integrity::IntegrityEngine;
use crate::domain::numbering::{SequenceAllocator, SeriesCode, SeriesKey};
use crate::domain::tax::{Percentage, TaxRuleResolver};
use crate::domain::tenant::TenantStore;
use crate::domain::unit_of_work::{LedgerStore, LedgerTransaction};

/// Validated line input; the tax rate is referenced by catalog code.
#[derive(Debug, Clone)]
pub struct LineInput {
  pub description: LineDescription,
  pub quantity: Quantity,
  pub unit_price: UnitPrice,
  pub discount: Percentage,
  pub tax_code: String,
}

#[derive(Debug, Clone)]
pub struct IssueDocumentData {
  pub tenant_id: Uuid,
  pub document_type: DocumentType,
  /// Defaults to the type's bootstrap series.
  pub series_code: Option<SeriesCode>,
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  pub lines: Vec<LineInput>,
  pub withholding: Percentage,
  pub rectifies: Option<Uuid>,
}

pub struct DocumentService {
  store: Arc<dyn LedgerStore>,
  tax_resolver: Arc<TaxRuleResolver>,
  allocator: Arc<SequenceAllocator>,
  integrity: Arc<IntegrityEngine>,
}

impl DocumentService {
  pub fn new(
    store: Arc<dyn LedgerStore>,
    tax_resolver: Arc<TaxRuleResolver>,
    allocator: Arc<SequenceAllocator>,
    integrity: Arc<IntegrityEngine>,
  ) -> Self {
    Self {
      store,
      tax_resolver,
      allocator,
      integrity,
    }
  }

  async fn price_lines(
    &self,
    lines: Vec<LineInput>,
    issue_date: NaiveDate,
  ) -> Result<Vec<PricedLine>, DocumentError> {
    if lines.is_empty() {
      return Err(DocumentError::NoLines);
    }

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
      let tax = self.tax_resolver.resolve(&line.tax_code, issue_date).await?;
      priced.push(PricedLine {
        description: line.description,
        quantity: line.quantity,
        unit_price: line.unit_price,
        discount: line.discount,
        tax,
      });
    }
    Ok(priced)
  }

  /// Issue a document in a single unit of work.
  ///
  /// Number allocation, the closed-year check, sealing and the chain head
  /// update either all commit or all roll back.
  #[instrument(skip(self, data), fields(tenant_id = %data.tenant_id, document_type = %data.document_type))]
  pub async fn issue(&self, data: IssueDocumentData) -> Result<Document, DocumentError> {
    if data.rectifies.is_some() && !data.document_type.is_invoice() {
      return Err(DocumentError::RectificationNotAllowed);
    }
    let lines = self.price_lines(data.lines, data.issue_date).await?;
    let fiscal_year = data.issue_date.year();
    let key = SeriesKey::new(
      data.tenant_id,
      data
        .series_code
        .unwrap_or_else(|| SeriesCode::default_for(data.document_type)),
      data.document_type,
      fiscal_year,
    );

    let mut tx = self.store.begin().await?;
    let allocated = self.allocator.allocate_in(tx.as_mut(), &key).await?;

    if year_is_closed(tx.as_mut(), data.tenant_id, fiscal_year).await? {
      return Err(DocumentError::FiscalYearClosed(fiscal_year));
    }

    let tenant = tx
      .find_tenant(data.tenant_id)
      .await?
      .ok_or(DocumentError::TenantNotFound(data.tenant_id))?;

    if let Some(original_id) = data.rectifies {
      let original = tx.find_document(data.tenant_id, original_id).await?;
      if !original.is_some_and(|doc| doc.is_invoice() && doc.is_sealed()) {
        return Err(DocumentError::RectifiedInvoiceNotFound(original_id));
      }
    }

    let mut document = Document::new(
      DocumentHeader {
        tenant_id: data.tenant_id,
        series_id: allocated.series_id,
        customer_id: data.customer_id,
        document_type: data.document_type,
        sequence_number: allocated.sequence,
        number: DocumentNumber::new(allocated.formatted)?,
        issuer_tax_id: tenant.tax_id,
        issue_date: data.issue_date,
        rectifies: data.rectifies,
      },
      lines,
      data.withholding,
    )?;

    let chain_head = if document.is_invoice() {
      Some(self.integrity.seal_in(tx.as_mut(), &mut document).await?)
    } else {
      None
    };

    tx.insert_document(&document).await?;
    if let Some(head) = &chain_head {
      tx.save_chain_head(head).await?;
    }
    tx.commit().await?;

    info!(
      document_id = %document.id,
      number = %document.number,
      grand_total = %document.totals.grand_total,
      chain_position = document.seal.as_ref().map(|s| s.chain_position),
      "Document issued"
    );

    Ok(document)
  }

  /// Replace the lines of an unsealed, unfrozen draft.
  pub async fn update_draft_lines(
    &self,
    tenant_id: Uuid,
    document_id: Uuid,
    lines: Vec<LineInput>,
  ) -> Result<Document, DocumentError> {
    let issue_date = self.get(tenant_id, document_id).await?.issue_date;
    let priced = self.price_lines(lines, issue_date).await?;

    let mut tx = self.store.begin().await?;
    let mut document = tx
      .find_document(tenant_id, document_id)
      .await?
      .ok_or(DocumentError::DocumentNotFound(document_id))?;
    document.replace_lines(priced)?;
    tx.update_document(&document).await?;
    tx.commit().await?;

    info!(document_id = %document_id, number = %document.number, "Draft lines replaced");
    Ok(document)
  }

  /// Delete an unsealed, unfrozen draft. Its number is not reused.
  pub async fn delete_draft(&self, tenant_id: Uuid, document_id: Uuid) -> Result<(), DocumentError> {
    let mut tx = self.store.begin().await?;
    let document = tx
      .find_document(tenant_id, document_id)
      .await?
      .ok_or(DocumentError::DocumentNotFound(document_id))?;
    document.ensure_deletable()?;
    tx.delete_document(tenant_id, document_id).await?;
    tx.commit().await?;

    info!(document_id = %document_id, number = %document.number, "Draft deleted");
    Ok(())
  }

  pub async fn get(&self, tenant_id: Uuid, document_id: Uuid) -> Result<Document, DocumentError> {
    let mut tx = self.store.begin().await?;
    tx.find_document(tenant_id, document_id)
      .await?
      .ok_or(DocumentError::DocumentNotFound(document_id))
  }
}

async fn year_is_closed(
  tx: &mut dyn LedgerTransaction,
  tenant_id: Uuid,
  fiscal_year: i32,
) -> Result<bool, DocumentError> {
  Ok(
    tx.latest_closure_for_year(tenant_id, fiscal_year)
      .await?
      .is_some_and(|closure| closure.state == ClosureState::Closed),
  )
}
