use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::ledger_store::PgLedgerTransaction;
use crate::domain::closure::{
  ClosureListing, ClosureState, ClosureStore, ClosureTotals, ClosureTransition, FiscalClosure,
  HistoryQuery, ReopenReason, Reopening, ReportArtifacts,
};
use crate::domain::errors::StorageError;
use crate::domain::integrity::Fingerprint;

#[derive(Debug, FromRow)]
struct ClosureRow {
  id: Uuid,
  sequence: i64,
  tenant_id: Uuid,
  fiscal_year: i32,
  state: String,
  invoice_count: i64,
  taxable_base: Decimal,
  vat: Decimal,
  surcharge: Decimal,
  withholding: Decimal,
  grand_total: Decimal,
  fingerprint: String,
  chain_anchor: Option<String>,
  closed_by: Uuid,
  closed_at: DateTime<Utc>,
  reopen_reason: Option<String>,
  reopened_by: Option<Uuid>,
  reopened_at: Option<DateTime<Utc>>,
  ledger_export_path: Option<String>,
  vat_summary_path: Option<String>,
}

impl TryFrom<ClosureRow> for FiscalClosure {
  type Error = StorageError;

  fn try_from(row: ClosureRow) -> Result<Self, Self::Error> {
    let reopening = match (row.reopen_reason, row.reopened_by, row.reopened_at) {
      (Some(reason), Some(reopened_by), Some(reopened_at)) => Some(Reopening {
        reason: ReopenReason::new(reason)?,
        reopened_by,
        reopened_at,
      }),
      (None, None, None) => None,
      _ => {
        return Err(StorageError::CorruptRecord(format!(
          "closure {} has partial reopening data",
          row.id
        )));
      }
    };

    let artifacts = match (row.ledger_export_path, row.vat_summary_path) {
      (Some(ledger_path), Some(vat_summary_path)) => Some(ReportArtifacts {
        ledger_path,
        vat_summary_path,
      }),
      _ => None,
    };

    Ok(FiscalClosure {
      id: row.id,
      tenant_id: row.tenant_id,
      fiscal_year: row.fiscal_year,
      sequence: row.sequence,
      state: ClosureState::from_str(&row.state)?,
      totals: ClosureTotals {
        invoice_count: row.invoice_count,
        taxable_base: row.taxable_base,
        vat: row.vat,
        surcharge: row.surcharge,
        withholding: row.withholding,
        grand_total: row.grand_total,
      },
      fingerprint: Fingerprint::new(row.fingerprint)?,
      chain_anchor: row.chain_anchor.map(Fingerprint::new).transpose()?,
      closed_by: row.closed_by,
      closed_at: row.closed_at,
      reopening,
      artifacts,
    })
  }
}

#[derive(Debug, FromRow)]
struct TransitionRow {
  id: Uuid,
  closure_id: Uuid,
  from_state: Option<String>,
  to_state: String,
  actor: Uuid,
  reason: Option<String>,
  occurred_at: DateTime<Utc>,
}

impl TryFrom<TransitionRow> for ClosureTransition {
  type Error = StorageError;

  fn try_from(row: TransitionRow) -> Result<Self, Self::Error> {
    Ok(ClosureTransition {
      id: row.id,
      closure_id: row.closure_id,
      from_state: row
        .from_state
        .as_deref()
        .map(ClosureState::from_str)
        .transpose()?,
      to_state: ClosureState::from_str(&row.to_state)?,
      actor: row.actor,
      reason: row.reason,
      occurred_at: row.occurred_at,
    })
  }
}

const CLOSURE_COLUMNS: &str = "id, sequence, tenant_id, fiscal_year, state, invoice_count, \
   taxable_base, vat, surcharge, withholding, grand_total, fingerprint, chain_anchor, closed_by, \
   closed_at, reopen_reason, reopened_by, reopened_at, ledger_export_path, vat_summary_path";

#[async_trait]
impl ClosureStore for PgLedgerTransaction {
  async fn latest_closure_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Option<FiscalClosure>, StorageError> {
    let row = sqlx::query_as::<_, ClosureRow>(&format!(
      r#"
            SELECT {CLOSURE_COLUMNS}
            FROM fiscal_closures
            WHERE tenant_id = $1 AND fiscal_year = $2
            ORDER BY sequence DESC
            LIMIT 1
            "#
    ))
    .bind(tenant_id)
    .bind(fiscal_year)
    .fetch_optional(&mut *self.tx)
    .await?;

    row.map(FiscalClosure::try_from).transpose()
  }

  async fn find_closure(
    &mut self,
    tenant_id: Uuid,
    closure_id: Uuid,
  ) -> Result<Option<FiscalClosure>, StorageError> {
    let row = sqlx::query_as::<_, ClosureRow>(&format!(
      "SELECT {CLOSURE_COLUMNS} FROM fiscal_closures WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(tenant_id)
    .bind(closure_id)
    .fetch_optional(&mut *self.tx)
    .await?;

    row.map(FiscalClosure::try_from).transpose()
  }

  async fn insert_closure(&mut self, closure: &FiscalClosure) -> Result<FiscalClosure, StorageError> {
    let sequence = sqlx::query_scalar::<_, i64>(
      r#"
            INSERT INTO fiscal_closures (
                id, tenant_id, fiscal_year, state, invoice_count, taxable_base, vat,
                surcharge, withholding, grand_total, fingerprint, chain_anchor,
                closed_by, closed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING sequence
            "#,
    )
    .bind(closure.id)
    .bind(closure.tenant_id)
    .bind(closure.fiscal_year)
    .bind(closure.state.as_str())
    .bind(closure.totals.invoice_count)
    .bind(closure.totals.taxable_base)
    .bind(closure.totals.vat)
    .bind(closure.totals.surcharge)
    .bind(closure.totals.withholding)
    .bind(closure.totals.grand_total)
    .bind(closure.fingerprint.value())
    .bind(closure.chain_anchor.as_ref().map(Fingerprint::value))
    .bind(closure.closed_by)
    .bind(closure.closed_at)
    .fetch_one(&mut *self.tx)
    .await?;

    Ok(FiscalClosure {
      sequence,
      ..closure.clone()
    })
  }

  async fn update_closure(&mut self, closure: &FiscalClosure) -> Result<(), StorageError> {
    // Totals and fingerprint are immutable once written
    let reopening = closure.reopening.as_ref();
    let artifacts = closure.artifacts.as_ref();

    sqlx::query(
      r#"
            UPDATE fiscal_closures
            SET state = $2, reopen_reason = $3, reopened_by = $4, reopened_at = $5,
                ledger_export_path = $6, vat_summary_path = $7
            WHERE id = $1
            "#,
    )
    .bind(closure.id)
    .bind(closure.state.as_str())
    .bind(reopening.map(|r| r.reason.value()))
    .bind(reopening.map(|r| r.reopened_by))
    .bind(reopening.map(|r| r.reopened_at))
    .bind(artifacts.map(|a| a.ledger_path.as_str()))
    .bind(artifacts.map(|a| a.vat_summary_path.as_str()))
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn insert_transition(&mut self, transition: &ClosureTransition) -> Result<(), StorageError> {
    sqlx::query(
      r#"
            INSERT INTO closure_transitions (
                id, closure_id, from_state, to_state, actor, reason, occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
    )
    .bind(transition.id)
    .bind(transition.closure_id)
    .bind(transition.from_state.map(|s| s.as_str()))
    .bind(transition.to_state.as_str())
    .bind(transition.actor)
    .bind(transition.reason.as_deref())
    .bind(transition.occurred_at)
    .execute(&mut *self.tx)
    .await?;

    Ok(())
  }

  async fn transitions_for(&mut self, closure_id: Uuid) -> Result<Vec<ClosureTransition>, StorageError> {
    let rows = sqlx::query_as::<_, TransitionRow>(
      r#"
            SELECT id, closure_id, from_state, to_state, actor, reason, occurred_at
            FROM closure_transitions
            WHERE closure_id = $1
            ORDER BY occurred_at, id
            "#,
    )
    .bind(closure_id)
    .fetch_all(&mut *self.tx)
    .await?;

    rows.into_iter().map(ClosureTransition::try_from).collect()
  }

  async fn list_closures(
    &mut self,
    tenant_id: Uuid,
    query: &HistoryQuery,
  ) -> Result<ClosureListing, StorageError> {
    let as_of = match query.as_of {
      Some(as_of) => as_of,
      None => sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(sequence) FROM fiscal_closures WHERE tenant_id = $1",
      )
      .bind(tenant_id)
      .fetch_one(&mut *self.tx)
      .await?
      .unwrap_or(0),
    };

    let total = sqlx::query_scalar::<_, i64>(
      r#"
            SELECT COUNT(*)
            FROM fiscal_closures
            WHERE tenant_id = $1 AND sequence <= $2
              AND ($3::int IS NULL OR fiscal_year = $3)
            "#,
    )
    .bind(tenant_id)
    .bind(as_of)
    .bind(query.fiscal_year)
    .fetch_one(&mut *self.tx)
    .await?;

    let rows = sqlx::query_as::<_, ClosureRow>(&format!(
      r#"
            SELECT {CLOSURE_COLUMNS}
            FROM fiscal_closures
            WHERE tenant_id = $1 AND sequence <= $2
              AND ($3::int IS NULL OR fiscal_year = $3)
            ORDER BY sequence DESC
            LIMIT $4 OFFSET $5
            "#
    ))
    .bind(tenant_id)
    .bind(as_of)
    .bind(query.fiscal_year)
    .bind(query.limit() as i64)
    .bind(query.offset() as i64)
    .fetch_all(&mut *self.tx)
    .await?;

    Ok(ClosureListing {
      items: rows
        .into_iter()
        .map(FiscalClosure::try_from)
        .collect::<Result<_, _>>()?,
      total: total as u64,
      as_of,
    })
  }
}
