use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::closure::{
  ClosureListing, ClosureState, ClosureStore, ClosureTransition, FiscalClosure, HistoryQuery,
  ONE_CLOSED_PER_YEAR_CONSTRAINT,
};
use crate::domain::document::{Document, DocumentStore, DocumentType};
use crate::domain::errors::StorageError;
use crate::domain::integrity::{ChainHead, ChainStore};
use crate::domain::numbering::{NumberingSeries, SeriesKey, SeriesStore};
use crate::domain::tenant::{Tenant, TenantStore};
use crate::domain::unit_of_work::{LedgerStore, LedgerTransaction};

const DOCUMENT_NUMBER_CONSTRAINT: &str = "documents_tenant_number_unique";

#[derive(Debug, Clone, Default)]
struct LedgerState {
  tenants: HashMap<Uuid, Tenant>,
  series: Vec<NumberingSeries>,
  documents: HashMap<Uuid, Document>,
  chain_heads: HashMap<Uuid, ChainHead>,
  closures: HashMap<Uuid, FiscalClosure>,
  transitions: Vec<ClosureTransition>,
  closure_sequence: i64,
}

/// In-process ledger store.
///
/// Units of work are fully serialized: `begin` takes an exclusive lock and
/// works on a copy of the state that `commit` publishes. Dropping the
/// transaction discards the copy.
#[derive(Clone, Default)]
pub struct MemoryLedgerStore {
  state: Arc<Mutex<LedgerState>>,
  fail_next_commit: Arc<AtomicBool>,
}

impl MemoryLedgerStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Tenants are created outside the ledger; this seeds one.
  pub async fn insert_tenant(&self, tenant: Tenant) {
    self.state.lock().await.tenants.insert(tenant.id, tenant);
  }

  pub async fn insert_series(&self, series: NumberingSeries) {
    self.state.lock().await.series.push(series);
  }

  /// Make the next `commit` fail, as if the connection dropped.
  pub fn fail_next_commit(&self) {
    self.fail_next_commit.store(true, Ordering::SeqCst);
  }

  pub async fn document(&self, document_id: Uuid) -> Option<Document> {
    self.state.lock().await.documents.get(&document_id).cloned()
  }

  pub async fn document_count(&self, tenant_id: Uuid) -> usize {
    self
      .state
      .lock()
      .await
      .documents
      .values()
      .filter(|document| document.tenant_id == tenant_id)
      .count()
  }

  pub async fn closure_count(&self, tenant_id: Uuid, fiscal_year: i32) -> usize {
    self
      .state
      .lock()
      .await
      .closures
      .values()
      .filter(|closure| closure.tenant_id == tenant_id && closure.fiscal_year == fiscal_year)
      .count()
  }

  pub async fn chain_head(&self, tenant_id: Uuid) -> Option<ChainHead> {
    self.state.lock().await.chain_heads.get(&tenant_id).cloned()
  }

  /// Edit a stored document behind the ledger's back.
  pub async fn tamper_document<F>(&self, document_id: Uuid, edit: F) -> bool
  where
    F: FnOnce(&mut Document),
  {
    match self.state.lock().await.documents.get_mut(&document_id) {
      Some(document) => {
        edit(document);
        true
      }
      None => false,
    }
  }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
  async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StorageError> {
    let guard = self.state.clone().lock_owned().await;
    let working = guard.clone();
    Ok(Box::new(MemoryLedgerTransaction {
      guard,
      working,
      fail_next_commit: self.fail_next_commit.clone(),
    }))
  }
}

pub struct MemoryLedgerTransaction {
  guard: OwnedMutexGuard<LedgerState>,
  working: LedgerState,
  fail_next_commit: Arc<AtomicBool>,
}

#[async_trait]
impl LedgerTransaction for MemoryLedgerTransaction {
  async fn commit(self: Box<Self>) -> Result<(), StorageError> {
    if self.fail_next_commit.swap(false, Ordering::SeqCst) {
      return Err(StorageError::TransactionFailed(
        "injected commit failure".to_string(),
      ));
    }
    let MemoryLedgerTransaction {
      mut guard, working, ..
    } = *self;
    *guard = working;
    Ok(())
  }
}

#[async_trait]
impl TenantStore for MemoryLedgerTransaction {
  async fn find_tenant(&mut self, tenant_id: Uuid) -> Result<Option<Tenant>, StorageError> {
    Ok(self.working.tenants.get(&tenant_id).cloned())
  }
}

#[async_trait]
impl SeriesStore for MemoryLedgerTransaction {
  async fn lock_series(&mut self, key: &SeriesKey) -> Result<Option<NumberingSeries>, StorageError> {
    Ok(
      self
        .working
        .series
        .iter()
        .find(|series| series.key() == *key)
        .cloned(),
    )
  }

  async fn lock_series_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, StorageError> {
    self.list_series(tenant_id, fiscal_year).await
  }

  async fn save_series(&mut self, series: &NumberingSeries) -> Result<(), StorageError> {
    if let Some(stored) = self
      .working
      .series
      .iter_mut()
      .find(|stored| stored.id == series.id && stored.next_number <= series.next_number)
    {
      stored.next_number = series.next_number;
      stored.state = series.state;
      stored.updated_at = series.updated_at;
    }
    Ok(())
  }

  async fn insert_series(&mut self, series: &NumberingSeries) -> Result<bool, StorageError> {
    let key = series.key();
    if self.working.series.iter().any(|stored| stored.key() == key) {
      return Ok(false);
    }
    self.working.series.push(series.clone());
    Ok(true)
  }

  async fn list_series(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Vec<NumberingSeries>, StorageError> {
    let mut series: Vec<NumberingSeries> = self
      .working
      .series
      .iter()
      .filter(|series| series.tenant_id == tenant_id && series.fiscal_year == fiscal_year)
      .cloned()
      .collect();
    series.sort_by(|a, b| {
      a.document_type
        .as_str()
        .cmp(b.document_type.as_str())
        .then_with(|| a.code.value().cmp(b.code.value()))
    });
    Ok(series)
  }
}

impl MemoryLedgerTransaction {
  fn tenant_documents(&self, tenant_id: Uuid) -> impl Iterator<Item = &Document> {
    self
      .working
      .documents
      .values()
      .filter(move |document| document.tenant_id == tenant_id)
  }
}

fn sort_by_chain_position(documents: &mut [Document]) {
  documents.sort_by_key(|document| {
    (
      document
        .seal
        .as_ref()
        .map_or(i64::MAX, |seal| seal.chain_position),
      document.created_at,
    )
  });
}

#[async_trait]
impl DocumentStore for MemoryLedgerTransaction {
  async fn insert_document(&mut self, document: &Document) -> Result<(), StorageError> {
    if self
      .tenant_documents(document.tenant_id)
      .any(|stored| stored.number == document.number)
    {
      return Err(StorageError::UniqueViolation(
        DOCUMENT_NUMBER_CONSTRAINT.to_string(),
      ));
    }
    self.working.documents.insert(document.id, document.clone());
    Ok(())
  }

  async fn find_document(
    &mut self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>, StorageError> {
    Ok(
      self
        .working
        .documents
        .get(&document_id)
        .filter(|document| document.tenant_id == tenant_id)
        .cloned(),
    )
  }

  // Transactions are already serialized by the store lock
  async fn lock_document(
    &mut self,
    tenant_id: Uuid,
    document_id: Uuid,
  ) -> Result<Option<Document>, StorageError> {
    self.find_document(tenant_id, document_id).await
  }

  async fn update_document(&mut self, document: &Document) -> Result<(), StorageError> {
    if let Some(stored) = self.working.documents.get_mut(&document.id) {
      let mut updated = document.clone();
      // Seal and lines are write-once for sealed invoices
      if stored.is_sealed() {
        updated.seal = stored.seal.clone();
        updated.lines = stored.lines.clone();
      }
      *stored = updated;
    }
    Ok(())
  }

  async fn delete_document(&mut self, tenant_id: Uuid, document_id: Uuid) -> Result<(), StorageError> {
    let deletable = self
      .working
      .documents
      .get(&document_id)
      .is_some_and(|document| document.tenant_id == tenant_id && !document.is_sealed());
    if deletable {
      self.working.documents.remove(&document_id);
    }
    Ok(())
  }

  async fn documents_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
    document_type: Option<DocumentType>,
  ) -> Result<Vec<Document>, StorageError> {
    let mut documents: Vec<Document> = self
      .tenant_documents(tenant_id)
      .filter(|document| document.fiscal_year == fiscal_year)
      .filter(|document| document_type.is_none_or(|t| document.document_type == t))
      .cloned()
      .collect();
    documents.sort_by_key(|document| (document.issue_date, document.sequence_number));
    Ok(documents)
  }

  async fn invoices_in_chain_order(&mut self, tenant_id: Uuid) -> Result<Vec<Document>, StorageError> {
    let mut invoices: Vec<Document> = self
      .tenant_documents(tenant_id)
      .filter(|document| document.is_invoice())
      .cloned()
      .collect();
    sort_by_chain_position(&mut invoices);
    Ok(invoices)
  }

  async fn unsent_invoices(
    &mut self,
    tenant_id: Uuid,
    stale_claims_before: DateTime<Utc>,
  ) -> Result<Vec<Document>, StorageError> {
    let mut invoices: Vec<Document> = self
      .tenant_documents(tenant_id)
      .filter(|document| document.awaits_resubmission(stale_claims_before))
      .cloned()
      .collect();
    sort_by_chain_position(&mut invoices);
    Ok(invoices)
  }

  async fn tenants_with_unsent_invoices(
    &mut self,
    stale_claims_before: DateTime<Utc>,
  ) -> Result<Vec<Uuid>, StorageError> {
    let mut tenants: Vec<Uuid> = self
      .working
      .documents
      .values()
      .filter(|document| document.awaits_resubmission(stale_claims_before))
      .map(|document| document.tenant_id)
      .collect();
    tenants.sort();
    tenants.dedup();
    Ok(tenants)
  }

  async fn freeze_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
    closure_id: Uuid,
  ) -> Result<u64, StorageError> {
    let mut frozen = 0;
    for document in self.working.documents.values_mut() {
      if document.tenant_id == tenant_id && document.fiscal_year == fiscal_year {
        document.freeze(closure_id);
        frozen += 1;
      }
    }
    Ok(frozen)
  }

  async fn unfreeze_closure(&mut self, closure_id: Uuid) -> Result<u64, StorageError> {
    let mut unfrozen = 0;
    for document in self.working.documents.values_mut() {
      if document.frozen_by == Some(closure_id) {
        document.unfreeze();
        unfrozen += 1;
      }
    }
    Ok(unfrozen)
  }
}

#[async_trait]
impl ChainStore for MemoryLedgerTransaction {
  async fn lock_chain_head(&mut self, tenant_id: Uuid) -> Result<Option<ChainHead>, StorageError> {
    Ok(Some(
      self
        .working
        .chain_heads
        .entry(tenant_id)
        .or_insert_with(|| ChainHead::empty(tenant_id))
        .clone(),
    ))
  }

  async fn save_chain_head(&mut self, head: &ChainHead) -> Result<(), StorageError> {
    self.working.chain_heads.insert(head.tenant_id, head.clone());
    Ok(())
  }
}

#[async_trait]
impl ClosureStore for MemoryLedgerTransaction {
  async fn latest_closure_for_year(
    &mut self,
    tenant_id: Uuid,
    fiscal_year: i32,
  ) -> Result<Option<FiscalClosure>, StorageError> {
    Ok(
      self
        .working
        .closures
        .values()
        .filter(|closure| closure.tenant_id == tenant_id && closure.fiscal_year == fiscal_year)
        .max_by_key(|closure| closure.sequence)
        .cloned(),
    )
  }

  async fn find_closure(
    &mut self,
    tenant_id: Uuid,
    closure_id: Uuid,
  ) -> Result<Option<FiscalClosure>, StorageError> {
    Ok(
      self
        .working
        .closures
        .get(&closure_id)
        .filter(|closure| closure.tenant_id == tenant_id)
        .cloned(),
    )
  }

  async fn insert_closure(&mut self, closure: &FiscalClosure) -> Result<FiscalClosure, StorageError> {
    let duplicate = closure.state == ClosureState::Closed
      && self.working.closures.values().any(|stored| {
        stored.tenant_id == closure.tenant_id
          && stored.fiscal_year == closure.fiscal_year
          && stored.state == ClosureState::Closed
      });
    if duplicate {
      return Err(StorageError::UniqueViolation(
        ONE_CLOSED_PER_YEAR_CONSTRAINT.to_string(),
      ));
    }

    self.working.closure_sequence += 1;
    let stored = FiscalClosure {
      sequence: self.working.closure_sequence,
      ..closure.clone()
    };
    self.working.closures.insert(stored.id, stored.clone());
    Ok(stored)
  }

  async fn update_closure(&mut self, closure: &FiscalClosure) -> Result<(), StorageError> {
    if let Some(stored) = self.working.closures.get_mut(&closure.id) {
      stored.state = closure.state;
      stored.reopening = closure.reopening.clone();
      stored.artifacts = closure.artifacts.clone();
    }
    Ok(())
  }

  async fn insert_transition(&mut self, transition: &ClosureTransition) -> Result<(), StorageError> {
    self.working.transitions.push(transition.clone());
    Ok(())
  }

  async fn transitions_for(&mut self, closure_id: Uuid) -> Result<Vec<ClosureTransition>, StorageError> {
    Ok(
      self
        .working
        .transitions
        .iter()
        .filter(|transition| transition.closure_id == closure_id)
        .cloned()
        .collect(),
    )
  }

  async fn list_closures(
    &mut self,
    tenant_id: Uuid,
    query: &HistoryQuery,
  ) -> Result<ClosureListing, StorageError> {
    let mut visible: Vec<&FiscalClosure> = self
      .working
      .closures
      .values()
      .filter(|closure| closure.tenant_id == tenant_id)
      .collect();
    let as_of = query.as_of.unwrap_or_else(|| {
      visible
        .iter()
        .map(|closure| closure.sequence)
        .max()
        .unwrap_or(0)
    });

    visible.retain(|closure| {
      closure.sequence <= as_of && query.fiscal_year.is_none_or(|year| closure.fiscal_year == year)
    });
    visible.sort_by_key(|closure| std::cmp::Reverse(closure.sequence));

    Ok(ClosureListing {
      total: visible.len() as u64,
      items: visible
        .into_iter()
        .skip(query.offset() as usize)
        .take(query.limit() as usize)
        .cloned()
        .collect(),
      as_of,
    })
  }
}
