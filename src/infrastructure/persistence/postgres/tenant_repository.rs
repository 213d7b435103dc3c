use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::ledger_store::PgLedgerTransaction;
use crate::domain::errors::StorageError;
use crate::domain::tenant::{TaxId, Tenant, TenantStore};

#[derive(Debug, FromRow)]
struct TenantRow {
  id: Uuid,
  tax_id: String,
  legal_name: String,
  namespace: String,
  provisioned_at: Option<DateTime<Utc>>,
  created_at: DateTime<Utc>,
}

impl TryFrom<TenantRow> for Tenant {
  type Error = StorageError;

  fn try_from(row: TenantRow) -> Result<Self, Self::Error> {
    Ok(Tenant {
      id: row.id,
      tax_id: TaxId::new(row.tax_id)?,
      legal_name: row.legal_name,
      namespace: row.namespace,
      provisioned_at: row.provisioned_at,
      created_at: row.created_at,
    })
  }
}

#[async_trait]
impl TenantStore for PgLedgerTransaction {
  async fn find_tenant(&mut self, tenant_id: Uuid) -> Result<Option<Tenant>, StorageError> {
    let row = sqlx::query_as::<_, TenantRow>(
      r#"
            SELECT id, tax_id, legal_name, namespace, provisioned_at, created_at
            FROM tenants
            WHERE id = $1
            "#,
    )
    .bind(tenant_id)
    .fetch_optional(&mut *self.tx)
    .await?;

    row.map(Tenant::try_from).transpose()
  }
}
