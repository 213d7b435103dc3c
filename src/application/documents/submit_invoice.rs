use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::integrity::{IntegrityError, IntegrityService};

#[derive(Debug, Deserialize)]
pub struct SubmitInvoiceCommand {
  pub tenant_id: Uuid,
  pub document_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SubmitInvoiceResponse {
  pub document_id: Uuid,
  pub number: String,
  pub status: String,
  pub sent_at: Option<DateTime<Utc>>,
  pub submission_attempts: i32,
}

pub struct SubmitInvoiceUseCase {
  integrity_service: Arc<IntegrityService>,
}

impl SubmitInvoiceUseCase {
  pub fn new(integrity_service: Arc<IntegrityService>) -> Self {
    Self { integrity_service }
  }

  pub async fn execute(
    &self,
    command: SubmitInvoiceCommand,
  ) -> Result<SubmitInvoiceResponse, IntegrityError> {
    let document = self
      .integrity_service
      .submit(command.tenant_id, command.document_id)
      .await?;

    Ok(SubmitInvoiceResponse {
      document_id: document.id,
      number: document.number.into_inner(),
      status: document.status.as_str().to_string(),
      sent_at: document.sent_at,
      submission_attempts: document.submission_attempts,
    })
  }
}
