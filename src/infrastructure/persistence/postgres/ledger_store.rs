use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::errors::StorageError;
use crate::domain::unit_of_work::{LedgerStore, LedgerTransaction};

/// PostgreSQL unit of work. The store traits are implemented for
/// [`PgLedgerTransaction`] in the sibling `*_repository` modules.
pub struct PgLedgerStore {
  pool: PgPool,
}

impl PgLedgerStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
  async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StorageError> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgLedgerTransaction { tx }))
  }
}

/// Open transaction. Dropping it without `commit` rolls back.
pub struct PgLedgerTransaction {
  pub(super) tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
  async fn commit(self: Box<Self>) -> Result<(), StorageError> {
    self
      .tx
      .commit()
      .await
      .map_err(|e| StorageError::TransactionFailed(e.to_string()))
  }
}
