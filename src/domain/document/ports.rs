use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entities::Document;
use super::value_objects::DocumentType;
use crate::domain::errors::StorageError;

/// Document persistence inside a unit of work. Lines travel with their document.
#[async_trait]
pub trait DocumentStore: Send {
  async fn insert_document(&mut self, document: &Document) -> Result<(), StorageError>;

  async fn find_document(
    &mut self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>, StorageError>;

  /// Like `find_document`, holding the row until the unit of work ends.
  async fn lock_document(
    &mut self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>, StorageError>;

  /// Rewrites header, status, submission fields and lines.
  async fn update_document(&mut self, document: &Document) -> Result<(), StorageError>;

  async fn delete_document(&mut self, tenant_id: Uuid, document_id: Uuid) -> Result<(), StorageError>;

  async fn documents_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
    document_type: Option<DocumentType>,
  ) -> Result<Vec<Document>, StorageError>;

  /// Sealed invoices of a tenant ordered by chain position.
  async fn invoices_in_chain_order(&mut self, tenant_id: Uuid) -> Result<Vec<Document>, StorageError>;

  /// Invoices the resubmission sweep should send, by chain position: never
  /// attempted, failed transiently, or claimed before `stale_claims_before`.
  /// Rejected invoices are excluded.
  async fn unsent_invoices(
    &mut self,
    tenant_id: Uuid,
    stale_claims_before: DateTime<Utc>,
  ) -> Result<Vec<Document>, StorageError>;

  async fn tenants_with_unsent_invoices(
    &mut self,
    stale_claims_before: DateTime<Utc>,
  ) -> Result<Vec<Uuid>, StorageError>;

  /// Marks every document of the year as frozen by `closure_id`. Returns the count.
  async fn freeze_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
    closure_id: Uuid,
  ) -> Result<u64, StorageError>;

  async fn unfreeze_closure(&mut self, closure_id: Uuid) -> Result<u64, StorageError>;
}
