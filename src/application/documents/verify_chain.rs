use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::integrity::{IntegrityError, IntegrityService};

#[derive(Debug, Deserialize)]
pub struct VerifyChainCommand {
  pub tenant_id: Uuid,
}

/// Returned only for an intact chain; a break surfaces as
/// [`IntegrityError::ChainBroken`] so callers never see its position.
#[derive(Debug, Serialize)]
pub struct VerifyChainResponse {
  pub valid: bool,
  pub checked: usize,
}

pub struct VerifyChainUseCase {
  integrity_service: Arc<IntegrityService>,
}

impl VerifyChainUseCase {
  pub fn new(integrity_service: Arc<IntegrityService>) -> Self {
    Self { integrity_service }
  }

  pub async fn execute(
    &self,
    command: VerifyChainCommand,
  ) -> Result<VerifyChainResponse, IntegrityError> {
    let report = self
      .integrity_service
      .verify_tenant_chain(command.tenant_id)
      .await?;

    if let Some(chain_break) = report.first_break {
      return Err(IntegrityError::ChainBroken {
        position: chain_break.position,
        document_id: chain_break.document_id,
        reason: chain_break.reason,
      });
    }

    Ok(VerifyChainResponse {
      valid: true,
      checked: report.checked,
    })
  }
}
