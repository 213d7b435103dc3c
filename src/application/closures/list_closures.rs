use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::get_closure::ClosureDto;
use crate::domain::closure::{ClosureError, FiscalClosureManager, HistoryQuery};

#[derive(Debug, Deserialize)]
pub struct ListClosuresCommand {
  pub tenant_id: Uuid,
  pub page: u32,
  pub page_size: u32,
  pub fiscal_year: Option<i32>,
  pub as_of: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListClosuresResponse {
  pub items: Vec<ClosureDto>,
  pub page: u32,
  pub page_size: u32,
  pub total: u64,
  pub total_pages: u32,
  /// Pass back on later pages to keep them stable.
  pub as_of: i64,
}

pub struct ListClosuresUseCase {
  closure_manager: Arc<FiscalClosureManager>,
}

impl ListClosuresUseCase {
  pub fn new(closure_manager: Arc<FiscalClosureManager>) -> Self {
    Self { closure_manager }
  }

  pub async fn execute(
    &self,
    command: ListClosuresCommand,
  ) -> Result<ListClosuresResponse, ClosureError> {
    let query = HistoryQuery::new(
      command.page,
      command.page_size,
      command.fiscal_year,
      command.as_of,
    )?;
    let page = self
      .closure_manager
      .get_history(command.tenant_id, query)
      .await?;

    Ok(ListClosuresResponse {
      items: page.items.iter().map(ClosureDto::from).collect(),
      page: page.page,
      page_size: page.page_size,
      total: page.total,
      total_pages: page.total_pages,
      as_of: page.as_of,
    })
  }
}
