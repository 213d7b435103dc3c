use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::document::{DocumentError, DocumentService};
use crate::domain::integrity::IntegrityEngine;

#[derive(Debug, Deserialize)]
pub struct GetVerificationPayloadCommand {
  pub tenant_id: Uuid,
  pub document_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct VerificationPayloadResponse {
  pub document_id: Uuid,
  pub url: String,
  /// Base64 PNG.
  pub qr_code: String,
}

pub struct GetVerificationPayloadUseCase {
  document_service: Arc<DocumentService>,
  integrity_engine: Arc<IntegrityEngine>,
}

impl GetVerificationPayloadUseCase {
  pub fn new(document_service: Arc<DocumentService>, integrity_engine: Arc<IntegrityEngine>) -> Self {
    Self {
      document_service,
      integrity_engine,
    }
  }

  pub async fn execute(
    &self,
    command: GetVerificationPayloadCommand,
  ) -> Result<VerificationPayloadResponse, DocumentError> {
    let document = self
      .document_service
      .get(command.tenant_id, command.document_id)
      .await?;
    let payload = self
      .integrity_engine
      .generate_verification_payload(Some(&document))?;

    Ok(VerificationPayloadResponse {
      document_id: document.id,
      url: payload.url,
      qr_code: payload.base64,
    })
  }
}
