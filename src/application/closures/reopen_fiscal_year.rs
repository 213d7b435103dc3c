use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::get_closure::ClosureDto;
use crate::domain::closure::{ClosureError, FiscalClosureManager};

#[derive(Debug, Deserialize)]
pub struct ReopenFiscalYearCommand {
  pub tenant_id: Uuid,
  pub closure_id: Uuid,
  pub reason: String,
  pub actor: Uuid,
}

pub struct ReopenFiscalYearUseCase {
  closure_manager: Arc<FiscalClosureManager>,
}

impl ReopenFiscalYearUseCase {
  pub fn new(closure_manager: Arc<FiscalClosureManager>) -> Self {
    Self { closure_manager }
  }

  pub async fn execute(&self, command: ReopenFiscalYearCommand) -> Result<ClosureDto, ClosureError> {
    let closure = self
      .closure_manager
      .reopen(
        command.tenant_id,
        command.closure_id,
        &command.reason,
        command.actor,
      )
      .await?;
    Ok(ClosureDto::from(&closure))
  }
}
