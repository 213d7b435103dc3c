use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::numbering::NumberingSeries;

#[derive(Debug, Serialize)]
pub struct SeriesDto {
  pub id: Uuid,
  pub code: String,
  pub document_type: String,
  pub fiscal_year: i32,
  pub next_number: i64,
  pub format_template: String,
  pub padding_width: i32,
  pub state: String,
  pub updated_at: DateTime<Utc>,
}

impl From<&NumberingSeries> for SeriesDto {
  fn from(series: &NumberingSeries) -> Self {
    Self {
      id: series.id,
      code: series.code.value().to_string(),
      document_type: series.document_type.as_str().to_string(),
      fiscal_year: series.fiscal_year,
      next_number: series.next_number,
      format_template: series.format_template.value().to_string(),
      padding_width: series.padding_width,
      state: series.state.as_str().to_string(),
      updated_at: series.updated_at,
    }
  }
}
