use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::entities::{AllocatedNumber, NumberingSeries, SeriesKey};
use super::errors::NumberingError;
use super::ports::SeriesStore;
use super::value_objects::FormatTemplate;
use crate::domain::document::DocumentType;
use crate::domain::errors::ValueObjectError;
use crate::domain::unit_of_work::{LedgerStore, LedgerTransaction};

/// Result of bootstrapping the default series of a fiscal year.
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
  pub created: Vec<NumberingSeries>,
  pub already_present: usize,
}

pub struct SequenceAllocator {
  store: Arc<dyn LedgerStore>,
  format_template: FormatTemplate,
  padding_width: usize,
}

impl SequenceAllocator {
  pub fn new(store: Arc<dyn LedgerStore>, format_template: FormatTemplate, padding_width: usize) -> Self {
    Self {
      store,
      format_template,
      padding_width,
    }
  }

  /// Allocate a number in a unit of work of its own.
  pub async fn allocate(&self, key: &SeriesKey) -> Result<AllocatedNumber, NumberingError> {
    let mut tx = self.store.begin().await?;
    let allocated = self.allocate_in(tx.as_mut(), key).await?;
    tx.commit().await?;
    Ok(allocated)
  }

  /// Allocate inside the caller's unit of work.
  ///
  /// The series row stays locked until that unit of work ends, so concurrent
  /// allocations on the same series are serialized and a rollback releases
  /// the number together with everything else.
  pub async fn allocate_in(
    &self,
    tx: &mut dyn LedgerTransaction,
    key: &SeriesKey,
  ) -> Result<AllocatedNumber, NumberingError> {
    let mut series = tx
      .lock_series(key)
      .await?
      .ok_or_else(|| NumberingError::SeriesNotFound(key.code.to_string()))?;

    let allocated = series.reserve()?;
    tx.save_series(&series).await?;

    debug!(
      tenant_id = %key.tenant_id,
      series = %key.code,
      fiscal_year = key.fiscal_year,
      sequence = allocated.sequence,
      "Allocated document number"
    );

    Ok(allocated)
  }

  /// Create the default series (one per document type) for a fiscal year.
  ///
  /// Idempotent: existing series are left untouched.
  pub async fn bootstrap_default_series(
    &self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<BootstrapOutcome, NumberingError> {
    if !(1900..=9999).contains(&fiscal_year) {
      return Err(NumberingError::Validation(ValueObjectError::InvalidFiscalYear(
        fiscal_year.to_string(),
      )));
    }

    let mut tx = self.store.begin().await?;
    let tenant = tx
      .find_tenant(tenant_id)
      .await?
      .ok_or(NumberingError::TenantNotFound(tenant_id))?;
    if !tenant.is_provisioned() {
      return Err(NumberingError::TenantNotProvisioned(tenant_id));
    }

    let mut created = Vec::new();
    let mut already_present = 0;
    for document_type in DocumentType::ALL {
      let series = NumberingSeries::new(
        SeriesKey::default_for(tenant_id, document_type, fiscal_year),
        self.format_template.clone(),
        self.padding_width,
      );
      if tx.insert_series(&series).await? {
        created.push(series);
      } else {
        already_present += 1;
      }
    }
    tx.commit().await?;

    info!(
      tenant_id = %tenant_id,
      fiscal_year,
      created = created.len(),
      already_present,
      "Bootstrapped default numbering series"
    );

    Ok(BootstrapOutcome {
      created,
      already_present,
    })
  }

  /// Lock a series permanently. Locking an already locked series is a no-op.
  pub async fn lock_series(&self, key: &SeriesKey) -> Result<NumberingSeries, NumberingError> {
    let mut tx = self.store.begin().await?;
    let mut series = tx
      .lock_series(key)
      .await?
      .ok_or_else(|| NumberingError::SeriesNotFound(key.code.to_string()))?;
    series.lock()?;
    tx.save_series(&series).await?;
    tx.commit().await?;

    info!(tenant_id = %key.tenant_id, series = %key.code, "Numbering series locked");
    Ok(series)
  }

  pub async fn list_series(
    &self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, NumberingError> {
    let mut tx = self.store.begin().await?;
    Ok(tx.list_series(tenant_id, fiscal_year).await?)
  }
}
