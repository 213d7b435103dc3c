use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::ledger_store::PgLedgerTransaction;
use crate::domain::document::DocumentType;
use crate::domain::errors::StorageError;
use crate::domain::numbering::{
  FormatTemplate, NumberingSeries, SeriesCode, SeriesKey, SeriesState, SeriesStore,
};

#[derive(Debug, FromRow)]
struct SeriesRow {
  id: Uuid,
  tenant_id: Uuid,
  code: String,
  document_type: String,
  fiscal_year: i32,
  next_number: i64,
  format_template: String,
  padding_width: i32,
  state: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<SeriesRow> for NumberingSeries {
  type Error = StorageError;

  fn try_from(row: SeriesRow) -> Result<Self, Self::Error> {
    Ok(NumberingSeries {
      id: row.id,
      tenant_id: row.tenant_id,
      code: SeriesCode::new(row.code)?,
      document_type: DocumentType::from_str(&row.document_type)?,
      fiscal_year: row.fiscal_year,
      next_number: row.next_number,
      format_template: FormatTemplate::new(row.format_template)?,
      padding_width: row.padding_width,
      state: SeriesState::from_str(&row.state)?,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

const SERIES_COLUMNS: &str = "id, tenant_id, code, document_type, fiscal_year, next_number, \
   format_template, padding_width, state, created_at, updated_at";

#[async_trait]
impl SeriesStore for PgLedgerTransaction {
  async fn lock_series(&mut self, key: &SeriesKey) -> Result<Option<NumberingSeries>, StorageError> {
    let row = sqlx::query_as::<_, SeriesRow>(&format!(
      r#"
            SELECT {SERIES_COLUMNS}
            FROM numbering_series
            WHERE tenant_id = $1 AND code = $2 AND document_type = $3 AND fiscal_year = $4
            FOR UPDATE
            "#
    ))
    .bind(key.tenant_id)
    .bind(key.code.value())
    .bind(key.document_type.as_str())
    .bind(key.fiscal_year)
    .fetch_optional(&mut *self.tx)
    .await?;

    row.map(NumberingSeries::try_from).transpose()
  }

  async fn lock_series_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, StorageError> {
    // Fixed lock order avoids deadlocks with concurrent closures
    let rows = sqlx::query_as::<_, SeriesRow>(&format!(
      r#"
            SELECT {SERIES_COLUMNS}
            FROM numbering_series
            WHERE tenant_id = $1 AND fiscal_year = $2
            ORDER BY id
            FOR UPDATE
            "#
    ))
    .bind(tenant_id)
    .bind(fiscal_year)
    .fetch_all(&mut *self.tx)
    .await?;

    rows.into_iter().map(NumberingSeries::try_from).collect()
  }

  async fn save_series(&mut self, series: &NumberingSeries) -> Result<(), StorageError> {
    sqlx::query(
      r#"
            UPDATE numbering_series
            SET next_number = $2, state = $3, updated_at = $4
            WHERE id = $1 AND next_number <= $2
            "#,
    )
    .bind(series.id)
    .bind(series.next_number)
    .bind(series.state.as_str())
    .bind(series.updated_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_series(&mut self, series: &NumberingSeries) -> Result<bool, StorageError> {
    let result = sqlx::query(
      r#"
            INSERT INTO numbering_series (
                id, tenant_id, code, document_type, fiscal_year, next_number,
                format_template, padding_width, state, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT ON CONSTRAINT numbering_series_key_unique DO NOTHING
            "#,
    )
    .bind(series.id)
    .bind(series.tenant_id)
    .bind(series.code.value())
    .bind(series.document_type.as_str())
    .bind(series.fiscal_year)
    .bind(series.next_number)
    .bind(series.format_template.value())
    .bind(series.padding_width)
    .bind(series.state.as_str())
    .bind(series.created_at)
    .bind(series.updated_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(result.rows_affected() == 1)
  }

  async fn list_series(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, StorageError> {
    let rows = sqlx::query_as::<_, SeriesRow>(&format!(
      r#"
            SELECT {SERIES_COLUMNS}
            FROM numbering_series
            WHERE tenant_id = $1 AND fiscal_year = $2
            ORDER BY document_type, code
            "#
    ))
    .bind(tenant_id)
    .bind(fiscal_year)
    .fetch_all(&mut *self.tx)
    .await?;

    rows.into_iter().map(NumberingSeries::try_from).collect()
  }
}
