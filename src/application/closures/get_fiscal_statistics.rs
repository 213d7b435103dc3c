use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::closure::{ClosureError, FiscalClosureManager, FiscalYearStatistics};

#[derive(Debug, Deserialize)]
pub struct GetFiscalStatisticsCommand {
  pub tenant_id: Uuid,
  pub fiscal_year: i32,
}

pub struct GetFiscalStatisticsUseCase {
  closure_manager: Arc<FiscalClosureManager>,
}

impl GetFiscalStatisticsUseCase {
  pub fn new(closure_manager: Arc<FiscalClosureManager>) -> Self {
    Self { closure_manager }
  }

  /// Statistics are returned as computed; they serialize without a DTO.
  pub async fn execute(
    &self,
    command: GetFiscalStatisticsCommand,
  ) -> Result<FiscalYearStatistics, ClosureError> {
    self
      .closure_manager
      .get_statistics(command.tenant_id, command.fiscal_year)
      .await
  }
}
