use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{NumberingSeries, SeriesKey};
use crate::domain::errors::StorageError;

#[async_trait]
pub trait SeriesStore: Send {
  /// Reads the series row and holds its lock until the unit of work ends.
  async fn lock_series(&mut self, key: &SeriesKey) -> Result<Option<NumberingSeries>, StorageError>;

  /// Locks every series of a tenant's fiscal year.
  async fn lock_series_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, StorageError>;

  async fn save_series(&mut self, series: &NumberingSeries) -> Result<(), StorageError>;

  /// Inserts unless a series with the same key exists. Returns whether a row was created.
  async fn insert_series(&mut self, series: &NumberingSeries) -> Result<bool, StorageError>;

  async fn list_series(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, StorageError>;
}
