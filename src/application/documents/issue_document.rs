use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::get_document::DocumentDetailsResponse;
use crate::domain::document::{
  DocumentError, DocumentService, DocumentType, IssueDocumentData, LineDescription, LineInput,
  Quantity, UnitPrice,
};
use crate::domain::numbering::SeriesCode;
use crate::domain::tax::Percentage;

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentLineInputDto {
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  #[serde(default)]
  pub discount_percentage: Option<Decimal>,
  pub tax_code: String,
}

impl DocumentLineInputDto {
  pub(crate) fn into_line_input(self) -> Result<LineInput, DocumentError> {
    Ok(LineInput {
      description: LineDescription::new(self.description)?,
      quantity: Quantity::new(self.quantity)?,
      unit_price: UnitPrice::new(self.unit_price)?,
      discount: self
        .discount_percentage
        .map(Percentage::new)
        .transpose()?
        .unwrap_or_default(),
      tax_code: self.tax_code,
    })
  }
}

pub(crate) fn line_inputs(lines: Vec<DocumentLineInputDto>) -> Result<Vec<LineInput>, DocumentError> {
  lines
    .into_iter()
    .map(DocumentLineInputDto::into_line_input)
    .collect()
}

#[derive(Debug, Deserialize)]
pub struct IssueDocumentCommand {
  pub tenant_id: Uuid,
  pub document_type: String,
  pub series_code: Option<String>,
  pub customer_id: Uuid,
  pub issue_date: NaiveDate,
  pub lines: Vec<DocumentLineInputDto>,
  pub withholding_percentage: Option<Decimal>,
  pub rectifies: Option<Uuid>,
}

pub struct IssueDocumentUseCase {
  document_service: Arc<DocumentService>,
}

impl IssueDocumentUseCase {
  pub fn new(document_service: Arc<DocumentService>) -> Self {
    Self { document_service }
  }

  pub async fn execute(
    &self,
    command: IssueDocumentCommand,
  ) -> Result<DocumentDetailsResponse, DocumentError> {
    let document_type = DocumentType::from_str(&command.document_type)?;
    let series_code = command.series_code.map(SeriesCode::new).transpose()?;
    let withholding = command
      .withholding_percentage
      .map(Percentage::new)
      .transpose()?
      .unwrap_or_default();

    let data = IssueDocumentData {
      tenant_id: command.tenant_id,
      document_type,
      series_code,
      customer_id: command.customer_id,
      issue_date: command.issue_date,
      lines: line_inputs(command.lines)?,
      withholding,
      rectifies: command.rectifies,
    };

    let document = self.document_service.issue(data).await?;
    Ok(DocumentDetailsResponse::from(&document))
  }
}
