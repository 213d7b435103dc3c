use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::get_series::SeriesDto;
use crate::domain::numbering::{NumberingError, SequenceAllocator};

#[derive(Debug, Deserialize)]
pub struct BootstrapSeriesCommand {
  pub tenant_id: Uuid,
  pub fiscal_year: i32,
}

#[derive(Debug, Serialize)]
pub struct BootstrapSeriesResponse {
  pub created: Vec<SeriesDto>,
  pub already_present: usize,
}

pub struct BootstrapSeriesUseCase {
  allocator: Arc<SequenceAllocator>,
}

impl BootstrapSeriesUseCase {
  pub fn new(allocator: Arc<SequenceAllocator>) -> Self {
    Self { allocator }
  }

  pub async fn execute(
    &self,
    command: BootstrapSeriesCommand,
  ) -> Result<BootstrapSeriesResponse, NumberingError> {
    let outcome = self
      .allocator
      .bootstrap_default_series(command.tenant_id, command.fiscal_year)
      .await?;

    Ok(BootstrapSeriesResponse {
      created: outcome.created.iter().map(SeriesDto::from).collect(),
      already_present: outcome.already_present,
    })
  }
}
