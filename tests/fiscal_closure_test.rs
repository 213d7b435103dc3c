mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{FISCAL_YEAR, TestLedger, date, line};
use taxledger::domain::closure::{ClosureError, ClosureState, HistoryQuery, YearStatus};
use taxledger::domain::document::{DocumentError, DocumentType, LifecycleError};

async fn sent_invoice_in(ledger: &TestLedger, fiscal_year: i32, price: Decimal) {
  ledger
    .allocator
    .bootstrap_default_series(ledger.tenant_id(), fiscal_year)
    .await
    .unwrap();
  let invoice = ledger
    .issue(
      DocumentType::Invoice,
      NaiveDate::from_ymd_opt(fiscal_year, 6, 1).unwrap(),
      vec![line("Hours", dec!(1), price, "IVA21")],
    )
    .await
    .unwrap();
  ledger
    .integrity
    .submit(ledger.tenant_id(), invoice.id)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_close_year_aggregates_and_freezes() {
  let ledger = TestLedger::new().await;
  let actor = Uuid::new_v4();
  ledger.issue_sent_invoices(&[dec!(100), dec!(200)]).await;
  let quote = ledger.issue_quote(dec!(75)).await;

  let closure = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, actor)
    .await
    .unwrap();

  assert_eq!(closure.state, ClosureState::Closed);
  assert_eq!(closure.sequence, 1);
  assert_eq!(closure.closed_by, actor);
  assert_eq!(closure.totals.invoice_count, 2);
  assert_eq!(closure.totals.taxable_base, dec!(300.00));
  assert_eq!(closure.totals.vat, dec!(63.00));
  assert_eq!(closure.totals.grand_total, dec!(363.00));

  let head = ledger.store.chain_head(ledger.tenant_id()).await.unwrap();
  assert_eq!(closure.chain_anchor, head.last_fingerprint);

  // Every document of the year is frozen, drafts included
  let frozen_quote = ledger.store.document(quote.id).await.unwrap();
  assert_eq!(frozen_quote.frozen_by, Some(closure.id));
  let update = ledger
    .documents
    .update_draft_lines(
      ledger.tenant_id(),
      quote.id,
      vec![line("Estimate", dec!(2), dec!(75), "IVA21")],
    )
    .await;
  assert!(matches!(
    update,
    Err(DocumentError::Lifecycle(LifecycleError::Frozen(_)))
  ));
}

#[tokio::test]
async fn test_close_writes_report_artifacts() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;

  let closure = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();

  let artifacts = closure.artifacts.expect("reports attached");
  let ledger_csv = std::fs::read_to_string(&artifacts.ledger_path).unwrap();
  assert!(ledger_csv.contains("F-00001/2024"));
  let summary = std::fs::read_to_string(&artifacts.vat_summary_path).unwrap();
  assert!(summary.contains("21.00,0.00,1,100.00,21.00,0.00"));
  assert!(
    std::path::Path::new(&artifacts.ledger_path)
      .starts_with(ledger.reports_dir.path().join(ledger.tenant_id().to_string()))
  );
}

#[tokio::test]
async fn test_closed_year_refuses_new_documents() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();

  let result = ledger
    .issue(
      DocumentType::Invoice,
      date(12, 30),
      vec![line("Late", dec!(1), dec!(10), "IVA21")],
    )
    .await;

  assert!(matches!(result, Err(DocumentError::FiscalYearClosed(2024))));
  assert_eq!(ledger.store.document_count(ledger.tenant_id()).await, 1);
}

#[tokio::test]
async fn test_closing_twice_keeps_one_closure() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;

  ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();
  let second = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await;

  assert!(matches!(second, Err(ClosureError::AlreadyClosed(2024))));
  assert_eq!(ledger.store.closure_count(ledger.tenant_id(), FISCAL_YEAR).await, 1);
}

#[tokio::test]
async fn test_pending_submissions_block_closure() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let unsent = ledger.issue_invoice(dec!(50)).await;

  let result = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await;
  assert!(matches!(
    result,
    Err(ClosureError::PendingSubmissions { pending: 1, .. })
  ));
  assert_eq!(ledger.store.closure_count(ledger.tenant_id(), FISCAL_YEAR).await, 0);

  let statistics = ledger
    .closures
    .get_statistics(ledger.tenant_id(), FISCAL_YEAR)
    .await
    .unwrap();
  assert!(!statistics.can_close);
  assert_eq!(statistics.pending, 1);

  ledger
    .integrity
    .submit(ledger.tenant_id(), unsent.id)
    .await
    .unwrap();
  let closure = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();
  assert_eq!(closure.totals.invoice_count, 2);
}

#[tokio::test]
async fn test_rejected_invoice_blocks_closure() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let rejected = ledger.issue_invoice(dec!(50)).await;
  ledger.authority.push_rejection(422, "NIF not registered").await;
  assert!(
    ledger
      .integrity
      .submit(ledger.tenant_id(), rejected.id)
      .await
      .is_err()
  );

  let report = ledger
    .integrity
    .submit_pending(ledger.tenant_id())
    .await
    .unwrap();
  assert_eq!(report.submitted + report.failed, 0);

  let result = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await;
  assert!(matches!(
    result,
    Err(ClosureError::PendingSubmissions { pending: 1, .. })
  ));
}

#[tokio::test]
async fn test_empty_year_has_nothing_to_close() {
  let ledger = TestLedger::new().await;
  ledger.issue_quote(dec!(10)).await;

  let result = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await;

  assert!(matches!(result, Err(ClosureError::NothingToClose(2024))));
}

#[tokio::test]
async fn test_unknown_tenant_cannot_close() {
  let ledger = TestLedger::new().await;

  let result = ledger
    .closures
    .close(Uuid::new_v4(), FISCAL_YEAR, Uuid::new_v4())
    .await;

  assert!(matches!(result, Err(ClosureError::TenantNotFound(_))));
}

#[tokio::test]
async fn test_reopen_requires_reason() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let closure = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();

  for reason in ["", "   "] {
    let result = ledger
      .closures
      .reopen(ledger.tenant_id(), closure.id, reason, Uuid::new_v4())
      .await;
    assert!(matches!(result, Err(ClosureError::ReasonRequired)));
  }

  let details = ledger
    .closures
    .get_closure(ledger.tenant_id(), closure.id)
    .await
    .unwrap();
  assert_eq!(details.closure.state, ClosureState::Closed);
  assert_eq!(details.transitions.len(), 1);
}

#[tokio::test]
async fn test_reopen_unfreezes_and_records_transition() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let quote = ledger.issue_quote(dec!(75)).await;
  let closer = Uuid::new_v4();
  let auditor = Uuid::new_v4();
  let closure = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, closer)
    .await
    .unwrap();

  let reopened = ledger
    .closures
    .reopen(
      ledger.tenant_id(),
      closure.id,
      "Missing supplier invoice",
      auditor,
    )
    .await
    .unwrap();

  assert_eq!(reopened.state, ClosureState::Reopened);
  assert_eq!(reopened.fingerprint, closure.fingerprint);
  let reopening = reopened.reopening.as_ref().unwrap();
  assert_eq!(reopening.reason.value(), "Missing supplier invoice");
  assert_eq!(reopening.reopened_by, auditor);

  let details = ledger
    .closures
    .get_closure(ledger.tenant_id(), closure.id)
    .await
    .unwrap();
  assert_eq!(details.transitions.len(), 2);
  let last = details.transitions.last().unwrap();
  assert_eq!(last.from_state, Some(ClosureState::Closed));
  assert_eq!(last.to_state, ClosureState::Reopened);
  assert_eq!(last.actor, auditor);
  assert_eq!(last.reason.as_deref(), Some("Missing supplier invoice"));

  // Drafts are editable again and numbering resumes without gaps
  assert!(ledger.store.document(quote.id).await.unwrap().frozen_by.is_none());
  ledger
    .documents
    .update_draft_lines(
      ledger.tenant_id(),
      quote.id,
      vec![line("Estimate", dec!(2), dec!(75), "IVA21")],
    )
    .await
    .unwrap();
  let late = ledger.issue_invoice(dec!(10)).await;
  assert_eq!(late.number.value(), "F-00002/2024");

  // A reopened closure cannot be reopened again
  assert!(matches!(
    ledger
      .closures
      .reopen(ledger.tenant_id(), closure.id, "again", auditor)
      .await,
    Err(ClosureError::NotClosed(_))
  ));

  let statistics = ledger
    .closures
    .get_statistics(ledger.tenant_id(), FISCAL_YEAR)
    .await
    .unwrap();
  assert_eq!(statistics.status, YearStatus::Reopened);
}

#[tokio::test]
async fn test_reclose_after_reopen_creates_new_closure() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let first = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();
  ledger
    .closures
    .reopen(ledger.tenant_id(), first.id, "Late invoice", Uuid::new_v4())
    .await
    .unwrap();
  ledger.issue_sent_invoices(&[dec!(50)]).await;

  let second = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();

  assert_ne!(second.id, first.id);
  assert_eq!(second.sequence, 2);
  assert_eq!(second.totals.invoice_count, 2);
  assert_ne!(second.fingerprint, first.fingerprint);
  assert_eq!(ledger.store.closure_count(ledger.tenant_id(), FISCAL_YEAR).await, 2);
}

#[tokio::test]
async fn test_history_pages_are_stable_with_as_of() {
  let ledger = TestLedger::new().await;
  for year in [2022, 2023] {
    sent_invoice_in(&ledger, year, dec!(100)).await;
  }
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let mut closures = Vec::new();
  for year in [2022, 2023, 2024] {
    closures.push(
      ledger
        .closures
        .close(ledger.tenant_id(), year, Uuid::new_v4())
        .await
        .unwrap(),
    );
  }

  let first_page = ledger
    .closures
    .get_history(ledger.tenant_id(), HistoryQuery::new(1, 2, None, None).unwrap())
    .await
    .unwrap();
  assert_eq!(first_page.total, 3);
  assert_eq!(first_page.total_pages, 2);
  assert_eq!(first_page.as_of, 3);
  let years: Vec<i32> = first_page.items.iter().map(|c| c.fiscal_year).collect();
  assert_eq!(years, vec![2024, 2023]);

  // A new closure lands between the two page reads
  ledger
    .closures
    .reopen(ledger.tenant_id(), closures[2].id, "Correction", Uuid::new_v4())
    .await
    .unwrap();
  ledger
    .closures
    .close(ledger.tenant_id(), 2024, Uuid::new_v4())
    .await
    .unwrap();

  let second_page = ledger
    .closures
    .get_history(
      ledger.tenant_id(),
      HistoryQuery::new(2, 2, None, Some(first_page.as_of)).unwrap(),
    )
    .await
    .unwrap();
  assert_eq!(second_page.total, 3);
  assert_eq!(second_page.items.len(), 1);
  assert_eq!(second_page.items[0].fiscal_year, 2022);

  let fresh = ledger
    .closures
    .get_history(ledger.tenant_id(), HistoryQuery::new(1, 2, None, None).unwrap())
    .await
    .unwrap();
  assert_eq!(fresh.as_of, 4);
  assert_eq!(fresh.total, 4);

  let only_2024 = ledger
    .closures
    .get_history(ledger.tenant_id(), HistoryQuery::new(1, 10, Some(2024), None).unwrap())
    .await
    .unwrap();
  assert_eq!(only_2024.total, 2);
}

#[tokio::test]
async fn test_statistics_by_quarter() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  ledger
    .issue(
      DocumentType::Invoice,
      date(11, 15),
      vec![line("Hours", dec!(1), dec!(200), "IVA21")],
    )
    .await
    .unwrap();

  let statistics = ledger
    .closures
    .get_statistics(ledger.tenant_id(), FISCAL_YEAR)
    .await
    .unwrap();

  assert_eq!(statistics.quarters.len(), 4);
  assert_eq!(statistics.quarters[0].sent, 1);
  assert_eq!(statistics.quarters[3].pending, 1);
  assert_eq!(statistics.quarters[3].totals.grand_total, dec!(242.00));
  assert_eq!(statistics.totals.invoice_count, 2);
  assert_eq!(statistics.status, YearStatus::Open);
  assert!(!statistics.can_close);
}
