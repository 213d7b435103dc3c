use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::integrity::{IntegrityError, IntegrityService};

#[derive(Debug, Deserialize)]
pub struct SubmitPendingCommand {
  pub tenant_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SubmitPendingResponse {
  pub submitted: usize,
  pub failed: usize,
}

pub struct SubmitPendingUseCase {
  integrity_service: Arc<IntegrityService>,
}

impl SubmitPendingUseCase {
  pub fn new(integrity_service: Arc<IntegrityService>) -> Self {
    Self { integrity_service }
  }

  pub async fn execute(
    &self,
    command: SubmitPendingCommand,
  ) -> Result<SubmitPendingResponse, IntegrityError> {
    let report = self
      .integrity_service
      .submit_pending(command.tenant_id)
      .await?;

    Ok(SubmitPendingResponse {
      submitted: report.submitted,
      failed: report.failed,
    })
  }
}
