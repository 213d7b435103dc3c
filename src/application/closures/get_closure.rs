use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::closure::{ClosureError, ClosureTransition, FiscalClosure, FiscalClosureManager};

#[derive(Debug, Deserialize)]
pub struct GetClosureCommand {
  pub tenant_id: Uuid,
  pub closure_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ClosureTotalsDto {
  pub invoice_count: i64,
  pub taxable_base: Decimal,
  pub vat: Decimal,
  pub surcharge: Decimal,
  pub withholding: Decimal,
  pub grand_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ClosureDto {
  pub id: Uuid,
  pub sequence: i64,
  pub fiscal_year: i32,
  pub state: String,
  pub totals: ClosureTotalsDto,
  pub fingerprint: String,
  pub chain_anchor: Option<String>,
  pub closed_by: Uuid,
  pub closed_at: DateTime<Utc>,
  pub reopen_reason: Option<String>,
  pub reopened_by: Option<Uuid>,
  pub reopened_at: Option<DateTime<Utc>>,
  pub ledger_export_path: Option<String>,
  pub vat_summary_path: Option<String>,
}

impl From<&FiscalClosure> for ClosureDto {
  fn from(closure: &FiscalClosure) -> Self {
    let reopening = closure.reopening.as_ref();
    let artifacts = closure.artifacts.as_ref();
    Self {
      id: closure.id,
      sequence: closure.sequence,
      fiscal_year: closure.fiscal_year,
      state: closure.state.as_str().to_string(),
      totals: ClosureTotalsDto {
        invoice_count: closure.totals.invoice_count,
        taxable_base: closure.totals.taxable_base,
        vat: closure.totals.vat,
        surcharge: closure.totals.surcharge,
        withholding: closure.totals.withholding,
        grand_total: closure.totals.grand_total,
      },
      fingerprint: closure.fingerprint.value().to_string(),
      chain_anchor: closure.chain_anchor.as_ref().map(|f| f.value().to_string()),
      closed_by: closure.closed_by,
      closed_at: closure.closed_at,
      reopen_reason: reopening.map(|r| r.reason.value().to_string()),
      reopened_by: reopening.map(|r| r.reopened_by),
      reopened_at: reopening.map(|r| r.reopened_at),
      ledger_export_path: artifacts.map(|a| a.ledger_path.clone()),
      vat_summary_path: artifacts.map(|a| a.vat_summary_path.clone()),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ClosureTransitionDto {
  pub from_state: Option<String>,
  pub to_state: String,
  pub actor: Uuid,
  pub reason: Option<String>,
  pub occurred_at: DateTime<Utc>,
}

impl From<&ClosureTransition> for ClosureTransitionDto {
  fn from(transition: &ClosureTransition) -> Self {
    Self {
      from_state: transition.from_state.map(|s| s.as_str().to_string()),
      to_state: transition.to_state.as_str().to_string(),
      actor: transition.actor,
      reason: transition.reason.clone(),
      occurred_at: transition.occurred_at,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ClosureDetailsResponse {
  pub closure: ClosureDto,
  pub transitions: Vec<ClosureTransitionDto>,
}

pub struct GetClosureUseCase {
  closure_manager: Arc<FiscalClosureManager>,
}

impl GetClosureUseCase {
  pub fn new(closure_manager: Arc<FiscalClosureManager>) -> Self {
    Self { closure_manager }
  }

  pub async fn execute(&self, command: GetClosureCommand) -> Result<ClosureDetailsResponse, ClosureError> {
    let details = self
      .closure_manager
      .get_closure(command.tenant_id, command.closure_id)
      .await?;

    Ok(ClosureDetailsResponse {
      closure: ClosureDto::from(&details.closure),
      transitions: details
        .transitions
        .iter()
        .map(ClosureTransitionDto::from)
        .collect(),
    })
  }
}
