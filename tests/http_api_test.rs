mod common;

use actix_web::{App, http::StatusCode, test, web};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

use common::{FISCAL_YEAR, TestLedger};
use taxledger::adapters::http::{
  ACTOR_HEADER, LedgerRouteDependencies, RequestIdMiddleware, configure_ledger_routes,
};
use taxledger::application::closures::{
  CloseFiscalYearUseCase, GetClosureUseCase, GetFiscalStatisticsUseCase, ListClosuresUseCase,
  ReopenFiscalYearUseCase,
};
use taxledger::application::documents::{
  DeleteDraftUseCase, GetDocumentUseCase, GetVerificationPayloadUseCase, IssueDocumentUseCase,
  SubmitInvoiceUseCase, SubmitPendingUseCase, UpdateDraftUseCase, VerifyChainUseCase,
};
use taxledger::application::numbering::{BootstrapSeriesUseCase, ListSeriesUseCase, LockSeriesUseCase};

fn dependencies(ledger: &TestLedger) -> LedgerRouteDependencies {
  LedgerRouteDependencies {
    issue_document_use_case: Arc::new(IssueDocumentUseCase::new(ledger.documents.clone())),
    get_document_use_case: Arc::new(GetDocumentUseCase::new(ledger.documents.clone())),
    update_draft_use_case: Arc::new(UpdateDraftUseCase::new(ledger.documents.clone())),
    delete_draft_use_case: Arc::new(DeleteDraftUseCase::new(ledger.documents.clone())),
    submit_invoice_use_case: Arc::new(SubmitInvoiceUseCase::new(ledger.integrity.clone())),
    submit_pending_use_case: Arc::new(SubmitPendingUseCase::new(ledger.integrity.clone())),
    verify_chain_use_case: Arc::new(VerifyChainUseCase::new(ledger.integrity.clone())),
    verification_payload_use_case: Arc::new(GetVerificationPayloadUseCase::new(
      ledger.documents.clone(),
      ledger.integrity_engine.clone(),
    )),
    bootstrap_series_use_case: Arc::new(BootstrapSeriesUseCase::new(ledger.allocator.clone())),
    list_series_use_case: Arc::new(ListSeriesUseCase::new(ledger.allocator.clone())),
    lock_series_use_case: Arc::new(LockSeriesUseCase::new(ledger.allocator.clone())),
    fiscal_statistics_use_case: Arc::new(GetFiscalStatisticsUseCase::new(ledger.closures.clone())),
    close_fiscal_year_use_case: Arc::new(CloseFiscalYearUseCase::new(ledger.closures.clone())),
    list_closures_use_case: Arc::new(ListClosuresUseCase::new(ledger.closures.clone())),
    get_closure_use_case: Arc::new(GetClosureUseCase::new(ledger.closures.clone())),
    reopen_fiscal_year_use_case: Arc::new(ReopenFiscalYearUseCase::new(ledger.closures.clone())),
  }
}

macro_rules! ledger_app {
  ($ledger:expr) => {{
    let deps = dependencies(&$ledger);
    test::init_service(
      App::new().wrap(RequestIdMiddleware::new()).service(
        web::scope("/api/v1/tenants/{tenant_id}")
          .configure(move |cfg| configure_ledger_routes(cfg, deps.clone())),
      ),
    )
    .await
  }};
}

fn tenant_path(ledger: &TestLedger, path: &str) -> String {
  format!("/api/v1/tenants/{}{}", ledger.tenant_id(), path)
}

fn amount(value: &Value) -> Decimal {
  value.as_str().unwrap().parse().unwrap()
}

fn invoice_body(unit_price: &str) -> Value {
  json!({
    "document_type": "invoice",
    "customer_id": Uuid::new_v4(),
    "issue_date": "2024-03-10",
    "lines": [{
      "description": "Consulting",
      "quantity": "3",
      "unit_price": unit_price,
      "discount_percentage": "10",
      "tax_code": "IVA21"
    }]
  })
}

#[actix_web::test]
async fn test_issue_and_fetch_invoice() {
  let ledger = TestLedger::new().await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/documents"))
    .set_json(invoice_body("100.00"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  assert!(resp.headers().contains_key("x-request-id"));

  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["number"], "F-00001/2024");
  assert_eq!(body["status"], "computed");
  assert_eq!(amount(&body["totals"]["taxable_base"]), dec!(270.00));
  assert_eq!(amount(&body["totals"]["tax_total"]), dec!(56.70));
  assert_eq!(amount(&body["totals"]["grand_total"]), dec!(326.70));
  assert_eq!(body["integrity"]["class_code"], "F2");

  let id = body["id"].as_str().unwrap();
  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, &format!("/documents/{}", id)))
    .to_request();
  let fetched: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(fetched["number"], "F-00001/2024");
}

#[actix_web::test]
async fn test_issue_validation_errors() {
  let ledger = TestLedger::new().await;
  let app = ledger_app!(ledger);

  let mut body = invoice_body("100.00");
  body["lines"] = json!([]);
  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/documents"))
    .set_json(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let error: Value = test::read_body_json(resp).await;
  assert_eq!(error["error"], "validation_error");

  let mut body = invoice_body("100.00");
  body["document_type"] = json!("receipt");
  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/documents"))
    .set_json(body)
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unknown_document_is_not_found() {
  let ledger = TestLedger::new().await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, &format!("/documents/{}", Uuid::new_v4())))
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let error: Value = test::read_body_json(resp).await;
  assert_eq!(error["error"], "not_found");
}

#[actix_web::test]
async fn test_verification_payload_endpoint() {
  let ledger = TestLedger::new().await;
  let invoice = ledger.issue_invoice(dec!(100)).await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::get()
    .uri(&tenant_path(
      &ledger,
      &format!("/documents/{}/verification", invoice.id),
    ))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;

  assert_eq!(body["document_id"], invoice.id.to_string());
  assert!(body["url"].as_str().unwrap().contains("numserie=F-00001%2F2024"));
  assert!(!body["qr_code"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn test_close_requires_actor_header() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/closures"))
    .set_json(json!({ "fiscal_year": FISCAL_YEAR }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/closures"))
    .insert_header((ACTOR_HEADER, Uuid::new_v4().to_string()))
    .set_json(json!({ "fiscal_year": FISCAL_YEAR }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let closure: Value = test::read_body_json(resp).await;
  assert_eq!(closure["state"], "closed");
  assert_eq!(closure["totals"]["invoice_count"], 1);

  // Second close conflicts without a retry hint
  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/closures"))
    .insert_header((ACTOR_HEADER, Uuid::new_v4().to_string()))
    .set_json(json!({ "fiscal_year": FISCAL_YEAR }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let error: Value = test::read_body_json(resp).await;
  assert_eq!(error["details"]["retry_later"], false);
}

#[actix_web::test]
async fn test_pending_submissions_conflict_with_retry_hint() {
  let ledger = TestLedger::new().await;
  ledger.issue_invoice(dec!(100)).await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/closures"))
    .insert_header((ACTOR_HEADER, Uuid::new_v4().to_string()))
    .set_json(json!({ "fiscal_year": FISCAL_YEAR }))
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let error: Value = test::read_body_json(resp).await;
  assert_eq!(error["error"], "conflict");
  assert_eq!(error["details"]["retry_later"], true);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/submissions/pending"))
    .to_request();
  let report: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(report["submitted"], 1);
}

#[actix_web::test]
async fn test_reopen_with_blank_reason_is_rejected() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100)]).await;
  let closure = ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();
  let app = ledger_app!(ledger);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, &format!("/closures/{}/reopen", closure.id)))
    .insert_header((ACTOR_HEADER, Uuid::new_v4().to_string()))
    .set_json(json!({ "reason": "  " }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, &format!("/closures/{}/reopen", closure.id)))
    .insert_header((ACTOR_HEADER, Uuid::new_v4().to_string()))
    .set_json(json!({ "reason": "Late supplier invoice" }))
    .to_request();
  let reopened: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(reopened["state"], "reopened");
  assert_eq!(reopened["reopen_reason"], "Late supplier invoice");

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, &format!("/closures/{}", closure.id)))
    .to_request();
  let details: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(details["transitions"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_history_and_chain_endpoints() {
  let ledger = TestLedger::new().await;
  ledger.issue_sent_invoices(&[dec!(100), dec!(200)]).await;
  ledger
    .closures
    .close(ledger.tenant_id(), FISCAL_YEAR, Uuid::new_v4())
    .await
    .unwrap();
  let app = ledger_app!(ledger);

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, "/closures?page=1&page_size=10"))
    .to_request();
  let history: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(history["total"], 1);
  assert_eq!(history["items"][0]["fiscal_year"], FISCAL_YEAR);
  assert!(history["as_of"].as_i64().unwrap() >= 1);

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, "/closures?page_size=500"))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, "/chain/verify"))
    .to_request();
  let chain: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(chain["valid"], true);
  assert_eq!(chain["checked"], 2);
}

#[actix_web::test]
async fn test_broken_chain_is_not_disclosed() {
  let ledger = TestLedger::new().await;
  ledger.issue_invoice(dec!(100)).await;
  let tampered = ledger.issue_invoice(dec!(200)).await;
  ledger
    .store
    .tamper_document(tampered.id, |document| {
      document.totals.grand_total += dec!(1);
    })
    .await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, "/chain/verify"))
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  let body = test::read_body(resp).await;
  let text = String::from_utf8(body.to_vec()).unwrap();
  assert!(!text.contains("position"));
  assert!(!text.contains(&tampered.id.to_string()));
  let error: Value = serde_json::from_str(&text).unwrap();
  assert_eq!(error["error"], "document_unavailable");
  assert_eq!(error["message"], "Document not available");
}

#[actix_web::test]
async fn test_oversized_line_is_a_validation_error() {
  let ledger = TestLedger::new().await;
  let app = ledger_app!(ledger);

  let mut body = invoice_body("100.00");
  body["lines"][0]["quantity"] = json!("100000000000000000000");
  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/documents"))
    .set_json(body)
    .to_request();
  let resp = test::call_service(&app, req).await;

  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let error: Value = test::read_body_json(resp).await;
  assert_eq!(error["error"], "validation_error");
}

#[actix_web::test]
async fn test_series_endpoints() {
  let ledger = TestLedger::new().await;
  let app = ledger_app!(ledger);

  let req = test::TestRequest::get()
    .uri(&tenant_path(&ledger, &format!("/series?fiscal_year={}", FISCAL_YEAR)))
    .to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed["series"].as_array().unwrap().len(), 3);

  // Already bootstrapped: nothing new is created
  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/series/bootstrap"))
    .set_json(json!({ "fiscal_year": FISCAL_YEAR }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let req = test::TestRequest::post()
    .uri(&tenant_path(&ledger, "/series/bootstrap"))
    .set_json(json!({ "fiscal_year": FISCAL_YEAR + 1 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
}
