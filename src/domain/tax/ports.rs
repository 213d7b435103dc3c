use async_trait::async_trait;

use super::entities::TaxRate;
use crate::domain::errors::StorageError;

/// Tax rate catalog. Read outside issuance transactions.
#[async_trait]
pub trait TaxRateRepository: Send + Sync {
  /// Every catalog entry registered under `code`, in any order.
  async fn find_by_code(&self, code: &str) -> Result<Vec<TaxRate>, StorageError>;
}
