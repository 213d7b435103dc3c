use async_trait::async_trait;
use uuid::Uuid;

use super::entities::{AuthoritySubmission, ChainHead};
use super::errors::{AuthorityError, IntegrityError};
use crate::domain::errors::StorageError;

#[async_trait]
pub trait ChainStore: Send {
  /// Reads the tenant's chain head and holds its lock until the unit of work ends.
  async fn lock_chain_head(&mut self, tenant_id: Uuid) -> Result<Option<ChainHead>, StorageError>;

  async fn save_chain_head(&mut self, head: &ChainHead) -> Result<(), StorageError>;
}

pub trait QrRenderer: Send + Sync {
  fn render_png(&self, data: &str) -> Result<Vec<u8>, IntegrityError>;
}

#[async_trait]
pub trait AuthorityClient: Send + Sync {
  async fn submit(&self, submission: &AuthoritySubmission) -> Result<(), AuthorityError>;
}
