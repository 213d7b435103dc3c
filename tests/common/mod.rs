#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use uuid::Uuid;

use taxledger::domain::closure::FiscalClosureManager;
use taxledger::domain::document::{
  Document, DocumentError, DocumentService, DocumentType, IssueDocumentData, LineDescription,
  LineInput, Quantity, UnitPrice,
};
use taxledger::domain::integrity::{
  AuthorityClient, AuthorityError, AuthoritySubmission, ClassificationPolicy, IntegrityEngine,
  IntegrityService,
};
use taxledger::domain::numbering::{FormatTemplate, SequenceAllocator};
use taxledger::domain::retry::RetryPolicy;
use taxledger::domain::tax::{Percentage, TaxRate, TaxRuleResolver};
use taxledger::domain::tenant::{TaxId, Tenant};
use taxledger::infrastructure::persistence::memory::{MemoryLedgerStore, MemoryTaxRateCatalog};
use taxledger::infrastructure::qr::PngQrRenderer;
use taxledger::infrastructure::reports::CsvReportExporter;

pub const FISCAL_YEAR: i32 = 2024;
pub const VERIFICATION_BASE_URL: &str = "https://verify.example/qr";

pub fn date(month: u32, day: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(FISCAL_YEAR, month, day).unwrap()
}

/// Authority double answering from a script; an empty script accepts.
#[derive(Default)]
pub struct ScriptedAuthority {
  script: Mutex<VecDeque<Result<(), AuthorityError>>>,
  received: Mutex<Vec<AuthoritySubmission>>,
  latency: Duration,
}

impl ScriptedAuthority {
  /// Answers only after `latency`, like a slow authority endpoint.
  pub fn slow(latency: Duration) -> Self {
    Self {
      latency,
      ..Self::default()
    }
  }

  pub async fn push_rejection(&self, status: u16, detail: &str) {
    self
      .push(Err(AuthorityError::Rejected {
        status,
        detail: detail.to_string(),
      }))
      .await;
  }

  pub async fn push(&self, response: Result<(), AuthorityError>) {
    self.script.lock().await.push_back(response);
  }

  pub async fn push_transient(&self, times: usize) {
    for _ in 0..times {
      self
        .push(Err(AuthorityError::Transient("503 Service Unavailable".into())))
        .await;
    }
  }

  pub async fn received(&self) -> Vec<AuthoritySubmission> {
    self.received.lock().await.clone()
  }
}

#[async_trait]
impl AuthorityClient for ScriptedAuthority {
  async fn submit(&self, submission: &AuthoritySubmission) -> Result<(), AuthorityError> {
    self.received.lock().await.push(submission.clone());
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
    self.script.lock().await.pop_front().unwrap_or(Ok(()))
  }
}

pub fn fast_retry() -> RetryPolicy {
  RetryPolicy {
    max_attempts: 3,
    initial_backoff: Duration::from_millis(1),
    multiplier: 2,
    max_backoff: Duration::from_millis(5),
  }
}

pub fn tax_catalog() -> MemoryTaxRateCatalog {
  let from = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
  MemoryTaxRateCatalog::new(vec![
    TaxRate::new("IVA21", Percentage::new(dec!(21)).unwrap(), None, from, None),
    TaxRate::new("IVA10", Percentage::new(dec!(10)).unwrap(), None, from, None),
    TaxRate::new(
      "IVA21RE",
      Percentage::new(dec!(21)).unwrap(),
      Some(Percentage::new(dec!(5.2)).unwrap()),
      from,
      None,
    ),
  ])
}

/// A provisioned tenant with default series for [`FISCAL_YEAR`] wired to
/// an in-memory ledger.
pub struct TestLedger {
  pub store: MemoryLedgerStore,
  pub tenant: Tenant,
  pub authority: Arc<ScriptedAuthority>,
  pub allocator: Arc<SequenceAllocator>,
  pub integrity_engine: Arc<IntegrityEngine>,
  pub documents: Arc<DocumentService>,
  pub integrity: Arc<IntegrityService>,
  pub closures: Arc<FiscalClosureManager>,
  pub reports_dir: TempDir,
}

impl TestLedger {
  pub async fn new() -> Self {
    let store = MemoryLedgerStore::new();
    let tenant = provisioned_tenant(&store, "B12345678").await;
    Self::with_store(store, tenant).await
  }

  pub async fn with_store(store: MemoryLedgerStore, tenant: Tenant) -> Self {
    let ledger = Arc::new(store.clone());
    let authority = Arc::new(ScriptedAuthority::default());
    let reports_dir = tempfile::tempdir().unwrap();

    let allocator = Arc::new(SequenceAllocator::new(
      ledger.clone(),
      FormatTemplate::new("{SERIE}-{NUMERO}/{EJERCICIO}").unwrap(),
      5,
    ));
    let integrity_engine = Arc::new(IntegrityEngine::new(
      ClassificationPolicy::default(),
      VERIFICATION_BASE_URL,
      Arc::new(PngQrRenderer::new()),
    ));
    let documents = Arc::new(DocumentService::new(
      ledger.clone(),
      Arc::new(TaxRuleResolver::new(Arc::new(tax_catalog()))),
      allocator.clone(),
      integrity_engine.clone(),
    ));
    let integrity = Arc::new(IntegrityService::new(
      ledger.clone(),
      authority.clone(),
      fast_retry(),
    ));
    let closures = Arc::new(FiscalClosureManager::new(
      ledger,
      Arc::new(CsvReportExporter::new(reports_dir.path())),
    ));

    allocator
      .bootstrap_default_series(tenant.id, FISCAL_YEAR)
      .await
      .unwrap();

    Self {
      store,
      tenant,
      authority,
      allocator,
      integrity_engine,
      documents,
      integrity,
      closures,
      reports_dir,
    }
  }

  pub fn tenant_id(&self) -> Uuid {
    self.tenant.id
  }

  pub async fn issue(
    &self,
    document_type: DocumentType,
    issue_date: NaiveDate,
    lines: Vec<LineInput>,
  ) -> Result<Document, DocumentError> {
    self
      .documents
      .issue(IssueDocumentData {
        tenant_id: self.tenant.id,
        document_type,
        series_code: None,
        customer_id: Uuid::new_v4(),
        issue_date,
        lines,
        withholding: Percentage::zero(),
        rectifies: None,
      })
      .await
  }

  /// One-line invoice at 21% VAT.
  pub async fn issue_invoice(&self, unit_price: Decimal) -> Document {
    self
      .issue(
        DocumentType::Invoice,
        date(3, 10),
        vec![line("Consulting", dec!(1), unit_price, "IVA21")],
      )
      .await
      .unwrap()
  }

  pub async fn issue_quote(&self, unit_price: Decimal) -> Document {
    self
      .issue(
        DocumentType::Quote,
        date(3, 10),
        vec![line("Estimate", dec!(1), unit_price, "IVA21")],
      )
      .await
      .unwrap()
  }

  /// Issue and submit invoices so the year can be closed.
  pub async fn issue_sent_invoices(&self, prices: &[Decimal]) -> Vec<Document> {
    let mut sent = Vec::new();
    for price in prices {
      let invoice = self.issue_invoice(*price).await;
      sent.push(
        self
          .integrity
          .submit(self.tenant.id, invoice.id)
          .await
          .unwrap(),
      );
    }
    sent
  }
}

pub async fn provisioned_tenant(store: &MemoryLedgerStore, tax_id: &str) -> Tenant {
  let mut tenant = Tenant::new(TaxId::new(tax_id).unwrap(), "Acme SL");
  tenant.mark_provisioned();
  store.insert_tenant(tenant.clone()).await;
  tenant
}

pub fn line(description: &str, quantity: Decimal, unit_price: Decimal, tax_code: &str) -> LineInput {
  LineInput {
    description: LineDescription::new(description).unwrap(),
    quantity: Quantity::new(quantity).unwrap(),
    unit_price: UnitPrice::new(unit_price).unwrap(),
    discount: Percentage::zero(),
    tax_code: tax_code.to_string(),
  }
}
