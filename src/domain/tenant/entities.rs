use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::TaxId;

// Tenant - isolation boundary owning series, documents and closures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
  pub id: Uuid,
  pub tax_id: TaxId,
  pub legal_name: String,
  pub namespace: String,
  pub provisioned_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl Tenant {
  pub fn new(tax_id: TaxId, legal_name: impl Into<String>) -> Self {
    let namespace = tax_id.namespace();
    Self {
      id: Uuid::new_v4(),
      tax_id,
      legal_name: legal_name.into(),
      namespace,
      provisioned_at: None,
      created_at: Utc::now(),
    }
  }

  pub fn mark_provisioned(&mut self) {
    if self.provisioned_at.is_none() {
      self.provisioned_at = Some(Utc::now());
    }
  }

  pub fn is_provisioned(&self) -> bool {
    self.provisioned_at.is_some()
  }
}
