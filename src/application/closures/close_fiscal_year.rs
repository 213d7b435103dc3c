use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::get_closure::ClosureDto;
use crate::domain::closure::{ClosureError, FiscalClosureManager};

#[derive(Debug, Deserialize)]
pub struct CloseFiscalYearCommand {
  pub tenant_id: Uuid,
  pub fiscal_year: i32,
  pub actor: Uuid,
}

pub struct CloseFiscalYearUseCase {
  closure_manager: Arc<FiscalClosureManager>,
}

impl CloseFiscalYearUseCase {
  pub fn new(closure_manager: Arc<FiscalClosureManager>) -> Self {
    Self { closure_manager }
  }

  pub async fn execute(&self, command: CloseFiscalYearCommand) -> Result<ClosureDto, ClosureError> {
    let closure = self
      .closure_manager
      .close(command.tenant_id, command.fiscal_year, command.actor)
      .await?;
    Ok(ClosureDto::from(&closure))
  }
}
