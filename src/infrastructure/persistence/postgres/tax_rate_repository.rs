use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::errors::StorageError;
use crate::domain::tax::{Percentage, TaxRate, TaxRateRepository};

#[derive(Debug, FromRow)]
struct TaxRateRow {
  id: Uuid,
  code: String,
  vat_percentage: Decimal,
  surcharge_percentage: Option<Decimal>,
  valid_from: NaiveDate,
  valid_to: Option<NaiveDate>,
}

impl TryFrom<TaxRateRow> for TaxRate {
  type Error = StorageError;

  fn try_from(row: TaxRateRow) -> Result<Self, Self::Error> {
    Ok(TaxRate {
      id: row.id,
      code: row.code,
      vat_percentage: Percentage::new(row.vat_percentage)?,
      surcharge_percentage: row.surcharge_percentage.map(Percentage::new).transpose()?,
      valid_from: row.valid_from,
      valid_to: row.valid_to,
    })
  }
}

pub struct PostgresTaxRateRepository {
  pool: PgPool,
}

impl PostgresTaxRateRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl TaxRateRepository for PostgresTaxRateRepository {
  async fn find_by_code(&self, code: &str) -> Result<Vec<TaxRate>, StorageError> {
    let rows = sqlx::query_as::<_, TaxRateRow>(
      r#"
            SELECT id, code, vat_percentage, surcharge_percentage, valid_from, valid_to
            FROM tax_rates
            WHERE code = $1
            ORDER BY valid_from DESC
            "#,
    )
    .bind(code)
    .fetch_all(&self.pool)
    .await?;

    rows.into_iter().map(TaxRate::try_from).collect()
  }
}
