use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::StorageError;

use super::entities::Tenant;

/// Read access to tenants from inside a unit of work.
///
/// Tenant CRUD and namespace provisioning live outside the ledger core; the
/// ledger only needs the legal identity of the issuer.
#[async_trait]
pub trait TenantStore: Send {
  async fn find_tenant(&mut self, tenant_id: Uuid) -> Result<Option<Tenant>, StorageError>;
}
