use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::document::{DocumentError, DocumentService};

#[derive(Debug, Deserialize)]
pub struct DeleteDraftCommand {
  pub tenant_id: Uuid,
  pub document_id: Uuid,
}

pub struct DeleteDraftUseCase {
  document_service: Arc<DocumentService>,
}

impl DeleteDraftUseCase {
  pub fn new(document_service: Arc<DocumentService>) -> Self {
    Self { document_service }
  }

  pub async fn execute(&self, command: DeleteDraftCommand) -> Result<(), DocumentError> {
    self
      .document_service
      .delete_draft(command.tenant_id, command.document_id)
      .await
  }
}
