use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use super::ledger_store::PgLedgerTransaction;
use crate::domain::document::{
  Document, DocumentLine, DocumentNumber, DocumentStatus, DocumentStore, DocumentTotals,
  DocumentType, LineAmounts, LineDescription, Quantity, UnitPrice,
};
use crate::domain::errors::StorageError;
use crate::domain::integrity::{DocumentClass, Fingerprint, IntegritySeal};
use crate::domain::tax::{Percentage, TaxRateSnapshot};
use crate::domain::tenant::TaxId;

#[derive(Debug, FromRow)]
struct DocumentRow {
  id: Uuid,
  tenant_id: Uuid,
  series_id: Uuid,
  customer_id: Uuid,
  document_type: String,
  fiscal_year: i32,
  sequence_number: i64,
  number: String,
  issuer_tax_id: String,
  issue_date: NaiveDate,
  withholding_percentage: Decimal,
  taxable_base: Decimal,
  tax_total: Decimal,
  surcharge_total: Decimal,
  withholding: Decimal,
  grand_total: Decimal,
  status: String,
  rectifies: Option<Uuid>,
  fingerprint: Option<String>,
  previous_fingerprint: Option<String>,
  document_class: Option<String>,
  class_code: Option<String>,
  verification_url: Option<String>,
  qr_payload: Option<String>,
  chain_position: Option<i64>,
  sealed_at: Option<DateTime<Utc>>,
  sent_at: Option<DateTime<Utc>>,
  last_submission_error: Option<String>,
  submission_attempts: i32,
  frozen_by: Option<Uuid>,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct DocumentLineRow {
  id: Uuid,
  document_id: Uuid,
  line_order: i32,
  description: String,
  quantity: Decimal,
  unit_price: Decimal,
  discount_percentage: Decimal,
  tax_rate_id: Uuid,
  vat_percentage: Decimal,
  surcharge_percentage: Option<Decimal>,
  discount_amount: Decimal,
  taxable_base: Decimal,
  tax_amount: Decimal,
  surcharge_amount: Decimal,
  line_total: Decimal,
}

impl TryFrom<DocumentLineRow> for DocumentLine {
  type Error = StorageError;

  fn try_from(row: DocumentLineRow) -> Result<Self, Self::Error> {
    Ok(DocumentLine {
      id: row.id,
      document_id: row.document_id,
      line_order: row.line_order,
      description: LineDescription::new(row.description)?,
      quantity: Quantity::new(row.quantity)?,
      unit_price: UnitPrice::new(row.unit_price)?,
      discount: Percentage::new(row.discount_percentage)?,
      tax: TaxRateSnapshot {
        tax_rate_id: row.tax_rate_id,
        vat_percentage: Percentage::new(row.vat_percentage)?,
        surcharge_percentage: row.surcharge_percentage.map(Percentage::new).transpose()?,
      },
      // Stored as persisted, not recomputed, so audits can detect tampering
      amounts: LineAmounts {
        discount_amount: row.discount_amount,
        taxable_base: row.taxable_base,
        tax_amount: row.tax_amount,
        surcharge_amount: row.surcharge_amount,
        line_total: row.line_total,
      },
    })
  }
}

fn seal_from_row(row: &DocumentRow) -> Result<Option<IntegritySeal>, StorageError> {
  let Some(fingerprint) = row.fingerprint.as_ref() else {
    return Ok(None);
  };
  let missing = |column: &str| {
    StorageError::CorruptRecord(format!("document {} is sealed but has no {}", row.id, column))
  };

  Ok(Some(IntegritySeal {
    fingerprint: Fingerprint::new(fingerprint.clone())?,
    previous_fingerprint: row
      .previous_fingerprint
      .clone()
      .map(Fingerprint::new)
      .transpose()?,
    document_class: DocumentClass::from_str(
      row
        .document_class
        .as_deref()
        .ok_or_else(|| missing("document_class"))?,
    )?,
    class_code: row.class_code.clone().ok_or_else(|| missing("class_code"))?,
    verification_url: row
      .verification_url
      .clone()
      .ok_or_else(|| missing("verification_url"))?,
    qr_payload: row.qr_payload.clone().unwrap_or_default(),
    chain_position: row.chain_position.ok_or_else(|| missing("chain_position"))?,
    sealed_at: row.sealed_at.ok_or_else(|| missing("sealed_at"))?,
  }))
}

fn document_from_row(row: DocumentRow, lines: Vec<DocumentLine>) -> Result<Document, StorageError> {
  let seal = seal_from_row(&row)?;

  Ok(Document {
    id: row.id,
    tenant_id: row.tenant_id,
    series_id: row.series_id,
    customer_id: row.customer_id,
    document_type: DocumentType::from_str(&row.document_type)?,
    fiscal_year: row.fiscal_year,
    sequence_number: row.sequence_number,
    number: DocumentNumber::new(row.number)?,
    issuer_tax_id: TaxId::new(row.issuer_tax_id)?,
    issue_date: row.issue_date,
    lines,
    withholding_percentage: Percentage::new(row.withholding_percentage)?,
    totals: DocumentTotals {
      taxable_base: row.taxable_base,
      tax_total: row.tax_total,
      surcharge_total: row.surcharge_total,
      withholding: row.withholding,
      grand_total: row.grand_total,
    },
    status: DocumentStatus::from_str(&row.status)?,
    rectifies: row.rectifies,
    seal,
    sent_at: row.sent_at,
    last_submission_error: row.last_submission_error,
    submission_attempts: row.submission_attempts,
    frozen_by: row.frozen_by,
    created_at: row.created_at,
    updated_at: row.updated_at,
  })
}

const DOCUMENT_COLUMNS: &str = "id, tenant_id, series_id, customer_id, document_type, fiscal_year, \
   sequence_number, number, issuer_tax_id, issue_date, withholding_percentage, taxable_base, \
   tax_total, surcharge_total, withholding, grand_total, status, rectifies, fingerprint, \
   previous_fingerprint, document_class, class_code, verification_url, qr_payload, \
   chain_position, sealed_at, sent_at, last_submission_error, submission_attempts, frozen_by, \
   created_at, updated_at";

impl PgLedgerTransaction {
  async fn load_lines(
    &mut self,
    document_ids: &[Uuid],
  ) -> Result<HashMap<Uuid, Vec<DocumentLine>>, StorageError> {
    let rows = sqlx::query_as::<_, DocumentLineRow>(
      r#"
            SELECT id, document_id, line_order, description, quantity, unit_price,
                   discount_percentage, tax_rate_id, vat_percentage, surcharge_percentage,
                   discount_amount, taxable_base, tax_amount, surcharge_amount, line_total
            FROM document_lines
            WHERE document_id = ANY($1)
            ORDER BY document_id, line_order
            "#,
    )
    .bind(document_ids)
    .fetch_all(&mut *self.tx)
    .await?;

    let mut lines: HashMap<Uuid, Vec<DocumentLine>> = HashMap::new();
    for row in rows {
      let line = DocumentLine::try_from(row)?;
      lines.entry(line.document_id).or_default().push(line);
    }
    Ok(lines)
  }

  async fn hydrate(&mut self, rows: Vec<DocumentRow>) -> Result<Vec<Document>, StorageError> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut lines = self.load_lines(&ids).await?;
    rows
      .into_iter()
      .map(|row| {
        let document_lines = lines.remove(&row.id).unwrap_or_default();
        document_from_row(row, document_lines)
      })
      .collect()
  }

  async fn insert_lines(&mut self, document: &Document) -> Result<(), StorageError> {
    for line in &document.lines {
      sqlx::query(
        r#"
              INSERT INTO document_lines (
                  id, document_id, line_order, description, quantity, unit_price,
                  discount_percentage, tax_rate_id, vat_percentage, surcharge_percentage,
                  discount_amount, taxable_base, tax_amount, surcharge_amount, line_total
              )
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
              "#,
      )
      .bind(line.id)
      .bind(line.document_id)
      .bind(line.line_order)
      .bind(line.description.value())
      .bind(line.quantity.value())
      .bind(line.unit_price.value())
      .bind(line.discount.value())
      .bind(line.tax.tax_rate_id)
      .bind(line.tax.vat_percentage.value())
      .bind(line.tax.surcharge_percentage.map(|p| p.value()))
      .bind(line.amounts.discount_amount)
      .bind(line.amounts.taxable_base)
      .bind(line.amounts.tax_amount)
      .bind(line.amounts.surcharge_amount)
      .bind(line.amounts.line_total)
      .execute(&mut *self.tx)
      .await?;
    }
    Ok(())
  }
}

#[async_trait]
impl DocumentStore for PgLedgerTransaction {
  async fn insert_document(&mut self, document: &Document) -> Result<(), StorageError> {
    let seal = document.seal.as_ref();

    sqlx::query(&format!(
      r#"
            INSERT INTO documents ({DOCUMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
                    $31, $32)
            "#
    ))
    .bind(document.id)
    .bind(document.tenant_id)
    .bind(document.series_id)
    .bind(document.customer_id)
    .bind(document.document_type.as_str())
    .bind(document.fiscal_year)
    .bind(document.sequence_number)
    .bind(document.number.value())
    .bind(document.issuer_tax_id.value())
    .bind(document.issue_date)
    .bind(document.withholding_percentage.value())
    .bind(document.totals.taxable_base)
    .bind(document.totals.tax_total)
    .bind(document.totals.surcharge_total)
    .bind(document.totals.withholding)
    .bind(document.totals.grand_total)
    .bind(document.status.as_str())
    .bind(document.rectifies)
    .bind(seal.map(|s| s.fingerprint.value()))
    .bind(seal.and_then(|s| s.previous_fingerprint.as_ref().map(Fingerprint::value)))
    .bind(seal.map(|s| s.document_class.as_str()))
    .bind(seal.map(|s| s.class_code.as_str()))
    .bind(seal.map(|s| s.verification_url.as_str()))
    .bind(seal.map(|s| s.qr_payload.as_str()))
    .bind(seal.map(|s| s.chain_position))
    .bind(seal.map(|s| s.sealed_at))
    .bind(document.sent_at)
    .bind(document.last_submission_error.as_deref())
    .bind(document.submission_attempts)
    .bind(document.frozen_by)
    .bind(document.created_at)
    .bind(document.updated_at)
    .execute(&mut *self.tx)
    .await?;

    self.insert_lines(document).await
  }

  async fn find_document(
    &mut self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>, StorageError> {
    let row = sqlx::query_as::<_, DocumentRow>(&format!(
      "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE tenant_id = $1 AND id = $2"
    ))
    .bind(tenant_id)
    .bind(document_id)
    .fetch_optional(&mut *self.tx)
    .await?;

    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn lock_document(
    &mut self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>, StorageError> {
    let row = sqlx::query_as::<_, DocumentRow>(&format!(
      "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(tenant_id)
    .bind(document_id)
    .fetch_optional(&mut *self.tx)
    .await?;

    match row {
      Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
      None => Ok(None),
    }
  }

  async fn update_document(&mut self, document: &Document) -> Result<(), StorageError> {
    // Integrity columns are write-once and deliberately absent here
    sqlx::query(
      r#"
            UPDATE documents
            SET taxable_base = $2, tax_total = $3, surcharge_total = $4, withholding = $5,
                grand_total = $6, status = $7, sent_at = $8, last_submission_error = $9,
                submission_attempts = $10, frozen_by = $11, updated_at = $12
            WHERE id = $1
            "#,
    )
    .bind(document.id)
    .bind(document.totals.taxable_base)
    .bind(document.totals.tax_total)
    .bind(document.totals.surcharge_total)
    .bind(document.totals.withholding)
    .bind(document.totals.grand_total)
    .bind(document.status.as_str())
    .bind(document.sent_at)
    .bind(document.last_submission_error.as_deref())
    .bind(document.submission_attempts)
    .bind(document.frozen_by)
    .bind(document.updated_at)
    .execute(&mut *self.tx)
    .await?;

    if !document.is_sealed() {
      sqlx::query("DELETE FROM document_lines WHERE document_id = $1")
        .bind(document.id)
        .execute(&mut *self.tx)
        .await?;
      self.insert_lines(document).await?;
    }
    Ok(())
  }

  async fn delete_document(&mut self, tenant_id: Uuid, document_id: Uuid) -> Result<(), StorageError> {
    sqlx::query("DELETE FROM documents WHERE tenant_id = $1 AND id = $2 AND fingerprint IS NULL")
      .bind(tenant_id)
      .bind(document_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn documents_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
    document_type: Option<DocumentType>,
  ) -> Result<Vec<Document>, StorageError> {
    let rows = sqlx::query_as::<_, DocumentRow>(&format!(
      r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE tenant_id = $1 AND fiscal_year = $2
              AND ($3::varchar IS NULL OR document_type = $3)
            ORDER BY issue_date, sequence_number
            "#
    ))
    .bind(tenant_id)
    .bind(fiscal_year)
    .bind(document_type.map(|t| t.as_str()))
    .fetch_all(&mut *self.tx)
    .await?;

    self.hydrate(rows).await
  }

  async fn invoices_in_chain_order(&mut self, tenant_id: Uuid) -> Result<Vec<Document>, StorageError> {
    let rows = sqlx::query_as::<_, DocumentRow>(&format!(
      r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE tenant_id = $1 AND document_type = 'invoice'
            ORDER BY chain_position NULLS LAST, created_at
            "#
    ))
    .bind(tenant_id)
    .fetch_all(&mut *self.tx)
    .await?;

    self.hydrate(rows).await
  }

  async fn unsent_invoices(
    &mut self,
    tenant_id: Uuid,
    stale_claims_before: DateTime<Utc>,
  ) -> Result<Vec<Document>, StorageError> {
    let rows = sqlx::query_as::<_, DocumentRow>(&format!(
      r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE tenant_id = $1 AND document_type = 'invoice'
              AND (status IN ('computed', 'submission_failed')
                   OR (status = 'submitting' AND updated_at < $2))
            ORDER BY chain_position
            "#
    ))
    .bind(tenant_id)
    .bind(stale_claims_before)
    .fetch_all(&mut *self.tx)
    .await?;

    self.hydrate(rows).await
  }

  async fn tenants_with_unsent_invoices(
    &mut self,
    stale_claims_before: DateTime<Utc>,
  ) -> Result<Vec<Uuid>, StorageError> {
    let tenants = sqlx::query_scalar::<_, Uuid>(
      r#"
            SELECT DISTINCT tenant_id
            FROM documents
            WHERE document_type = 'invoice'
              AND (status IN ('computed', 'submission_failed')
                   OR (status = 'submitting' AND updated_at < $1))
            "#,
    )
    .bind(stale_claims_before)
    .fetch_all(&mut *self.tx)
    .await?;

    Ok(tenants)
  }

  async fn freeze_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
    closure_id: Uuid,
  ) -> Result<u64, StorageError> {
    let result = sqlx::query(
      r#"
            UPDATE documents
            SET frozen_by = $3, updated_at = NOW()
            WHERE tenant_id = $1 AND fiscal_year = $2
            "#,
    )
    .bind(tenant_id)
    .bind(fiscal_year)
    .bind(closure_id)
    .execute(&mut *self.tx)
    .await?;

    Ok(result.rows_affected())
  }

  async fn unfreeze_closure(&mut self, closure_id: Uuid) -> Result<u64, StorageError> {
    let result = sqlx::query(
      r#"
            UPDATE documents
            SET frozen_by = NULL, updated_at = NOW()
            WHERE frozen_by = $1
            "#,
    )
    .bind(closure_id)
    .execute(&mut *self.tx)
    .await?;

    Ok(result.rows_affected())
  }
}
