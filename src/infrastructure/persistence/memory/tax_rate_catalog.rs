use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::StorageError;
use crate::domain::tax::{TaxRate, TaxRateRepository};

/// Tax rate catalog held in memory.
#[derive(Default)]
pub struct MemoryTaxRateCatalog {
  rates: RwLock<Vec<TaxRate>>,
}

impl MemoryTaxRateCatalog {
  pub fn new(rates: Vec<TaxRate>) -> Self {
    Self {
      rates: RwLock::new(rates),
    }
  }

  pub async fn add(&self, rate: TaxRate) {
    self.rates.write().await.push(rate);
  }
}

#[async_trait]
impl TaxRateRepository for MemoryTaxRateCatalog {
  async fn find_by_code(&self, code: &str) -> Result<Vec<TaxRate>, StorageError> {
    Ok(
      self
        .rates
        .read()
        .await
        .iter()
        .filter(|rate| rate.code == code)
        .cloned()
        .collect(),
    )
  }
}
