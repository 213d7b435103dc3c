//! Transaction boundary shared by every ledger operation.
//!
//! A [`LedgerTransaction`] exposes the per-context store traits over one
//! storage transaction. Dropping it without calling `commit` rolls every
//! change back.

use async_trait::async_trait;

use crate::domain::closure::ClosureStore;
use crate::domain::document::DocumentStore;
use crate::domain::errors::StorageError;
use crate::domain::integrity::ChainStore;
use crate::domain::numbering::SeriesStore;
use crate::domain::tenant::TenantStore;

#[async_trait]
pub trait LedgerTransaction:
  TenantStore + SeriesStore + DocumentStore + ChainStore + ClosureStore + Send
{
  async fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
  async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StorageError>;
}
