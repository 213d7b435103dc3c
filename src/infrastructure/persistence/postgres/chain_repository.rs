use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ledger_store::PgLedgerTransaction;
use crate::domain::errors::StorageError;
use crate::domain::integrity::{ChainHead, ChainStore, Fingerprint};

#[derive(Debug, FromRow)]
struct ChainHeadRow {
  tenant_id: Uuid,
  last_document_id: Option<Uuid>,
  last_fingerprint: Option<String>,
  length: i64,
  updated_at: DateTime<Utc>,
}

impl TryFrom<ChainHeadRow> for ChainHead {
  type Error = StorageError;

  fn try_from(row: ChainHeadRow) -> Result<Self, Self::Error> {
    Ok(ChainHead {
      tenant_id: row.tenant_id,
      last_document_id: row.last_document_id,
      last_fingerprint: row.last_fingerprint.map(Fingerprint::new).transpose()?,
      length: row.length,
      updated_at: row.updated_at,
    })
  }
}

#[async_trait]
impl ChainStore for PgLedgerTransaction {
  async fn lock_chain_head(&mut self, tenant_id: Uuid) -> Result<Option<ChainHead>, StorageError> {
    // Materialize the row first so the very first invoices of a tenant also serialize
    sqlx::query(
      r#"
            INSERT INTO chain_heads (tenant_id, length, updated_at)
            VALUES ($1, 0, NOW())
            ON CONFLICT (tenant_id) DO NOTHING
            "#,
    )
    .bind(tenant_id)
    .execute(&mut *self.tx)
    .await?;

    let row = sqlx::query_as::<_, ChainHeadRow>(
      r#"
            SELECT tenant_id, last_document_id, last_fingerprint, length, updated_at
            FROM chain_heads
            WHERE tenant_id = $1
            FOR UPDATE
            "#,
    )
    .bind(tenant_id)
    .fetch_optional(&mut *self.tx)
    .await?;

    row.map(ChainHead::try_from).transpose()
  }

  async fn save_chain_head(&mut self, head: &ChainHead) -> Result<(), StorageError> {
    sqlx::query(
      r#"
            UPDATE chain_heads
            SET last_document_id = $2, last_fingerprint = $3, length = $4, updated_at = $5
            WHERE tenant_id = $1
            "#,
    )
    .bind(head.tenant_id)
    .bind(head.last_document_id)
    .bind(head.last_fingerprint.as_ref().map(Fingerprint::value))
    .bind(head.length)
    .bind(head.updated_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }
}
