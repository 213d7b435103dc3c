use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::get_document::DocumentDetailsResponse;
use super::issue_document::{DocumentLineInputDto, line_inputs};
use crate::domain::document::{DocumentError, DocumentService};

#[derive(Debug, Deserialize)]
pub struct UpdateDraftCommand {
  pub tenant_id: Uuid,
  pub document_id: Uuid,
  pub lines: Vec<DocumentLineInputDto>,
}

pub struct UpdateDraftUseCase {
  document_service: Arc<DocumentService>,
}

impl UpdateDraftUseCase {
  pub fn new(document_service: Arc<DocumentService>) -> Self {
    Self { document_service }
  }

  pub async fn execute(
    &self,
    command: UpdateDraftCommand,
  ) -> Result<DocumentDetailsResponse, DocumentError> {
    let lines = line_inputs(command.lines)?;
    let document = self
      .document_service
      .update_draft_lines(command.tenant_id, command.document_id, lines)
      .await?;
    Ok(DocumentDetailsResponse::from(&document))
  }
}
