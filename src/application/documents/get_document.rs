use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::document::{Document, DocumentError, DocumentLine, DocumentService};

#[derive(Debug, Deserialize)]
pub struct GetDocumentCommand {
  pub tenant_id: Uuid,
  pub document_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct DocumentLineDto {
  pub id: Uuid,
  pub line_order: i32,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub discount_percentage: Decimal,
  pub tax_rate_id: Uuid,
  pub vat_percentage: Decimal,
  pub surcharge_percentage: Option<Decimal>,
  pub discount_amount: Decimal,
  pub taxable_base: Decimal,
  pub tax_amount: Decimal,
  pub surcharge_amount: Decimal,
  pub line_total: Decimal,
}

impl From<&DocumentLine> for DocumentLineDto {
  fn from(line: &DocumentLine) -> Self {
    Self {
      id: line.id,
      line_order: line.line_order,
      description: line.description.value().to_string(),
      quantity: line.quantity.value(),
      unit_price: line.unit_price.value(),
      discount_percentage: line.discount.value(),
      tax_rate_id: line.tax.tax_rate_id,
      vat_percentage: line.tax.vat_percentage.value(),
      surcharge_percentage: line.tax.surcharge_percentage.map(|p| p.value()),
      discount_amount: line.amounts.discount_amount,
      taxable_base: line.amounts.taxable_base,
      tax_amount: line.amounts.tax_amount,
      surcharge_amount: line.amounts.surcharge_amount,
      line_total: line.amounts.line_total,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct DocumentTotalsDto {
  pub taxable_base: Decimal,
  pub tax_total: Decimal,
  pub surcharge_total: Decimal,
  pub withholding: Decimal,
  pub grand_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct IntegritySealDto {
  pub fingerprint: String,
  pub previous_fingerprint: Option<String>,
  pub document_class: String,
  pub class_code: String,
  pub verification_url: String,
  pub qr_payload: String,
  pub chain_position: i64,
  pub sealed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DocumentDetailsResponse {
  pub id: Uuid,
  pub tenant_id: Uuid,
  pub series_id: Uuid,
  pub customer_id: Uuid,
  pub document_type: String,
  pub fiscal_year: i32,
  pub number: String,
  pub issuer_tax_id: String,
  pub issue_date: NaiveDate,
  pub status: String,
  pub rectifies: Option<Uuid>,
  pub withholding_percentage: Decimal,
  pub lines: Vec<DocumentLineDto>,
  pub totals: DocumentTotalsDto,
  pub integrity: Option<IntegritySealDto>,
  pub sent_at: Option<DateTime<Utc>>,
  pub last_submission_error: Option<String>,
  pub submission_attempts: i32,
  pub frozen: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentDetailsResponse {
  fn from(document: &Document) -> Self {
    Self {
      id: document.id,
      tenant_id: document.tenant_id,
      series_id: document.series_id,
      customer_id: document.customer_id,
      document_type: document.document_type.as_str().to_string(),
      fiscal_year: document.fiscal_year,
      number: document.number.value().to_string(),
      issuer_tax_id: document.issuer_tax_id.value().to_string(),
      issue_date: document.issue_date,
      status: document.status.as_str().to_string(),
      rectifies: document.rectifies,
      withholding_percentage: document.withholding_percentage.value(),
      lines: document.lines.iter().map(DocumentLineDto::from).collect(),
      totals: DocumentTotalsDto {
        taxable_base: document.totals.taxable_base,
        tax_total: document.totals.tax_total,
        surcharge_total: document.totals.surcharge_total,
        withholding: document.totals.withholding,
        grand_total: document.totals.grand_total,
      },
      integrity: document.seal.as_ref().map(|seal| IntegritySealDto {
        fingerprint: seal.fingerprint.value().to_string(),
        previous_fingerprint: seal
          .previous_fingerprint
          .as_ref()
          .map(|f| f.value().to_string()),
        document_class: seal.document_class.as_str().to_string(),
        class_code: seal.class_code.clone(),
        verification_url: seal.verification_url.clone(),
        qr_payload: seal.qr_payload.clone(),
        chain_position: seal.chain_position,
        sealed_at: seal.sealed_at,
      }),
      sent_at: document.sent_at,
      last_submission_error: document.last_submission_error.clone(),
      submission_attempts: document.submission_attempts,
      frozen: document.frozen_by.is_some(),
      created_at: document.created_at,
      updated_at: document.updated_at,
    }
  }
}

pub struct GetDocumentUseCase {
  document_service: Arc<DocumentService>,
}

impl GetDocumentUseCase {
  pub fn new(document_service: Arc<DocumentService>) -> Self {
    Self { document_service }
  }

  pub async fn execute(
    &self,
    command: GetDocumentCommand,
  ) -> Result<DocumentDetailsResponse, DocumentError> {
    let document = self
      .document_service
      .get(command.tenant_id, command.document_id)
      .await?;
    Ok(DocumentDetailsResponse::from(&document))
  }
}
