//! Ledger flows against a real PostgreSQL. Needs Docker:
//! `cargo test --test postgres_store_test -- --ignored`

mod common;

use futures_util::future::join_all;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::collections::BTreeSet;
use std::sync::Arc;
use testcontainers::ImageExt;
use testcontainers_modules::postgres::Postgres;
use testcontainers_modules::testcontainers::{ContainerAsync, runners::AsyncRunner};
use uuid::Uuid;

use common::{FISCAL_YEAR, ScriptedAuthority, VERIFICATION_BASE_URL, date, fast_retry, line};
use taxledger::domain::closure::{ClosureError, FiscalClosureManager};
use taxledger::domain::document::{DocumentService, DocumentType, IssueDocumentData};
use taxledger::domain::integrity::{ClassificationPolicy, IntegrityEngine, IntegrityService};
use taxledger::domain::numbering::{FormatTemplate, SequenceAllocator, SeriesKey};
use taxledger::domain::tax::{Percentage, TaxRuleResolver};
use taxledger::domain::tenant::{TaxId, Tenant};
use taxledger::domain::unit_of_work::LedgerStore;
use taxledger::infrastructure::persistence::postgres::{PgLedgerStore, PostgresTaxRateRepository};
use taxledger::infrastructure::qr::PngQrRenderer;
use taxledger::infrastructure::reports::CsvReportExporter;

async fn setup_test_db() -> (PgPool, ContainerAsync<Postgres>) {
  let container = Postgres::default()
    .with_tag("16-alpine")
    .start()
    .await
    .expect("Failed to start postgres container");

  let host = container.get_host().await.expect("Failed to get host");
  let port = container
    .get_host_port_ipv4(5432)
    .await
    .expect("Failed to get port");
  let database_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

  let pool = PgPoolOptions::new()
    .max_connections(10)
    .connect(&database_url)
    .await
    .expect("Failed to connect to test database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  (pool, container)
}

async fn seed_tenant(pool: &PgPool) -> Tenant {
  let mut tenant = Tenant::new(TaxId::new("B12345678").unwrap(), "Acme SL");
  tenant.mark_provisioned();

  sqlx::query(
    r#"
        INSERT INTO tenants (id, tax_id, legal_name, namespace, provisioned_at, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
  )
  .bind(tenant.id)
  .bind(tenant.tax_id.value())
  .bind(&tenant.legal_name)
  .bind(&tenant.namespace)
  .bind(tenant.provisioned_at)
  .bind(tenant.created_at)
  .execute(pool)
  .await
  .expect("Failed to insert tenant");

  sqlx::query(
    r#"
        INSERT INTO tax_rates (id, code, vat_percentage, surcharge_percentage, valid_from, valid_to)
        VALUES ($1, 'IVA21', 21.00, NULL, '2020-01-01', NULL)
        "#,
  )
  .bind(Uuid::new_v4())
  .execute(pool)
  .await
  .expect("Failed to insert tax rate");

  tenant
}

struct PgLedger {
  tenant: Tenant,
  allocator: Arc<SequenceAllocator>,
  documents: Arc<DocumentService>,
  integrity: Arc<IntegrityService>,
  closures: Arc<FiscalClosureManager>,
  _reports_dir: tempfile::TempDir,
}

async fn pg_ledger(pool: PgPool) -> PgLedger {
  let tenant = seed_tenant(&pool).await;
  let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool.clone()));
  let reports_dir = tempfile::tempdir().unwrap();

  let allocator = Arc::new(SequenceAllocator::new(
    store.clone(),
    FormatTemplate::new("{SERIE}-{NUMERO}/{EJERCICIO}").unwrap(),
    5,
  ));
  let engine = Arc::new(IntegrityEngine::new(
    ClassificationPolicy::default(),
    VERIFICATION_BASE_URL,
    Arc::new(PngQrRenderer::new()),
  ));
  let documents = Arc::new(DocumentService::new(
    store.clone(),
    Arc::new(TaxRuleResolver::new(Arc::new(PostgresTaxRateRepository::new(pool)))),
    allocator.clone(),
    engine,
  ));
  let integrity = Arc::new(IntegrityService::new(
    store.clone(),
    Arc::new(ScriptedAuthority::default()),
    fast_retry(),
  ));
  let closures = Arc::new(FiscalClosureManager::new(
    store,
    Arc::new(CsvReportExporter::new(reports_dir.path())),
  ));

  allocator
    .bootstrap_default_series(tenant.id, FISCAL_YEAR)
    .await
    .unwrap();

  PgLedger {
    tenant,
    allocator,
    documents,
    integrity,
    closures,
    _reports_dir: reports_dir,
  }
}

fn invoice(tenant_id: Uuid) -> IssueDocumentData {
  IssueDocumentData {
    tenant_id,
    document_type: DocumentType::Invoice,
    series_code: None,
    customer_id: Uuid::new_v4(),
    issue_date: date(5, 20),
    lines: vec![line("Consulting", dec!(3), dec!(100), "IVA21")],
    withholding: Percentage::zero(),
    rectifies: None,
  }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_allocations_under_row_locks() {
  let (pool, _container) = setup_test_db().await;
  let ledger = pg_ledger(pool).await;
  let key = SeriesKey::default_for(ledger.tenant.id, DocumentType::DeliveryNote, FISCAL_YEAR);

  let allocations = join_all((0..25).map(|_| {
    let allocator = Arc::clone(&ledger.allocator);
    let key = key.clone();
    tokio::spawn(async move { allocator.allocate(&key).await })
  }))
  .await;

  let sequences: BTreeSet<i64> = allocations
    .into_iter()
    .map(|joined| joined.unwrap().unwrap().sequence)
    .collect();
  assert_eq!(sequences, (1..=25).collect::<BTreeSet<i64>>());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_issue_chain_and_close_round_trip() {
  let (pool, _container) = setup_test_db().await;
  let ledger = pg_ledger(pool).await;
  let tenant_id = ledger.tenant.id;

  let first = ledger.documents.issue(invoice(tenant_id)).await.unwrap();
  let second = ledger.documents.issue(invoice(tenant_id)).await.unwrap();
  assert_eq!(first.number.value(), "F-00001/2024");
  assert_eq!(second.number.value(), "F-00002/2024");
  assert_eq!(first.totals.grand_total, dec!(363.00));

  let stored = ledger.documents.get(tenant_id, second.id).await.unwrap();
  assert_eq!(stored.seal, second.seal);
  assert_eq!(stored.lines.len(), 1);

  let report = ledger.integrity.verify_tenant_chain(tenant_id).await.unwrap();
  assert!(report.is_valid());
  assert_eq!(report.checked, 2);

  assert!(matches!(
    ledger.closures.close(tenant_id, FISCAL_YEAR, Uuid::new_v4()).await,
    Err(ClosureError::PendingSubmissions { pending: 2, .. })
  ));

  let submitted = ledger.integrity.submit_pending(tenant_id).await.unwrap();
  assert_eq!(submitted.submitted, 2);

  let closure = ledger
    .closures
    .close(tenant_id, FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(closure.totals.invoice_count, 2);
  assert_eq!(closure.totals.grand_total, dec!(726.00));
  assert_eq!(closure.chain_anchor.as_ref(), second.seal.as_ref().map(|s| &s.fingerprint));

  assert!(matches!(
    ledger.closures.close(tenant_id, FISCAL_YEAR, Uuid::new_v4()).await,
    Err(ClosureError::AlreadyClosed(2024))
  ));
  assert!(ledger.documents.issue(invoice(tenant_id)).await.is_err());

  let reopened = ledger
    .closures
    .reopen(tenant_id, closure.id, "Supplier correction", Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(reopened.fingerprint, closure.fingerprint);

  let third = ledger.documents.issue(invoice(tenant_id)).await.unwrap();
  assert_eq!(third.number.value(), "F-00003/2024");
}
