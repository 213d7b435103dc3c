use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::get_series::SeriesDto;
use crate::domain::document::DocumentType;
use crate::domain::numbering::{NumberingError, SequenceAllocator, SeriesCode, SeriesKey};

#[derive(Debug, Deserialize)]
pub struct LockSeriesCommand {
  pub tenant_id: Uuid,
  pub code: String,
  pub document_type: String,
  pub fiscal_year: i32,
}

pub struct LockSeriesUseCase {
  allocator: Arc<SequenceAllocator>,
}

impl LockSeriesUseCase {
  pub fn new(allocator: Arc<SequenceAllocator>) -> Self {
    Self { allocator }
  }

  pub async fn execute(&self, command: LockSeriesCommand) -> Result<SeriesDto, NumberingError> {
    let key = SeriesKey::new(
      command.tenant_id,
      SeriesCode::new(command.code)?,
      DocumentType::from_str(&command.document_type)?,
      command.fiscal_year,
    );
    let series = self.allocator.lock_series(&key).await?;
    Ok(SeriesDto::from(&series))
  }
}
