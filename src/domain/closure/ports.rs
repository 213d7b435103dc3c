use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{ClosureListing, ClosureTransition, FiscalClosure, ReportArtifacts};
use super::errors::ClosureError;
use super::value_objects::HistoryQuery;
use crate::domain::document::Document;
use crate::domain::errors::StorageError;

#[async_trait]
pub trait ClosureStore: Send {
  /// Highest-sequence closure of the year, whatever its state.
  async fn latest_closure_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Option<FiscalClosure>, StorageError>;

  async fn find_closure(
    &mut self,
    tenant_id: Uuid,
    closure_id: Uuid,
  ) -> Result<Option<FiscalClosure>, StorageError>;

  /// Persists a new closure and returns it with its storage-assigned sequence.
  async fn insert_closure(&mut self, closure: &FiscalClosure) -> Result<FiscalClosure, StorageError>;

  async fn update_closure(&mut self, closure: &FiscalClosure) -> Result<(), StorageError>;

  async fn insert_transition(&mut self, transition: &ClosureTransition) -> Result<(), StorageError>;

  async fn transitions_for(&mut self, closure_id: Uuid) -> Result<Vec<ClosureTransition>, StorageError>;

  /// Newest first by sequence, limited to sequences up to `query.as_of` when set.
  async fn list_closures(
    &mut self,
    tenant_id: Uuid,
    query: &HistoryQuery,
  ) -> Result<ClosureListing, StorageError>;
}

/// Writes the period-end report files of a closure.
#[async_trait]
pub trait ReportExporter: Send + Sync {
  async fn export(
    &self,
    closure: &FiscalClosure,
    invoices: &[Document],
  ) -> Result<ReportArtifacts, ClosureError>;
}
