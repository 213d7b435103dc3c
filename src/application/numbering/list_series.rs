use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::get_series::SeriesDto;
use crate::domain::numbering::{NumberingError, SequenceAllocator};

#[derive(Debug, Deserialize)]
pub struct ListSeriesCommand {
  pub tenant_id: Uuid,
  pub fiscal_year: i32,
}

#[derive(Debug, Serialize)]
pub struct ListSeriesResponse {
  pub series: Vec<SeriesDto>,
}

pub struct ListSeriesUseCase {
  allocator: Arc<SequenceAllocator>,
}

impl ListSeriesUseCase {
  pub fn new(allocator: Arc<SequenceAllocator>) -> Self {
    Self { allocator }
  }

  pub async fn execute(&self, command: ListSeriesCommand) -> Result<ListSeriesResponse, NumberingError> {
    let series = self
      .allocator
      .list_series(command.tenant_id, command.fiscal_year)
      .await?;

    Ok(ListSeriesResponse {
      series: series.iter().map(SeriesDto::from).collect(),
    })
  }
}
