mod common;

use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{TestLedger, fast_retry};
use taxledger::domain::document::DocumentStatus;
use taxledger::domain::integrity::{
  AuthorityClient, AuthorityError, AuthoritySubmission, IntegrityService,
};
use taxledger::infrastructure::authority::HttpAuthorityClient;

fn client(server: &MockServer, timeout: Duration) -> HttpAuthorityClient {
  HttpAuthorityClient::new(format!("{}/records", server.uri()), timeout).unwrap()
}

fn submission() -> AuthoritySubmission {
  AuthoritySubmission {
    issuer_tax_id: "B12345678".to_string(),
    document_number: "F-00001/2024".to_string(),
    issue_date: chrono::NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
    document_class: "F2".to_string(),
    taxable_base: dec!(100.00),
    tax_total: dec!(21.00),
    surcharge_total: dec!(0),
    withholding: dec!(0),
    grand_total: dec!(121.00),
    fingerprint: "NWi8FmQn9iviTrBPxpjTqB+QHbThl6NuHm2HaHqO4dE=".to_string(),
    previous_fingerprint: None,
    chain_position: 1,
    rectified_document_id: None,
  }
}

#[tokio::test]
async fn test_accepted_submission() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/records"))
    .and(body_partial_json(serde_json::json!({
      "issuer_tax_id": "B12345678",
      "document_number": "F-00001/2024",
      "document_class": "F2"
    })))
    .respond_with(ResponseTemplate::new(201))
    .expect(1)
    .mount(&server)
    .await;

  let result = client(&server, Duration::from_secs(5)).submit(&submission()).await;

  assert!(result.is_ok());
}

#[tokio::test]
async fn test_client_error_is_rejection_with_body() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/records"))
    .respond_with(ResponseTemplate::new(422).set_body_string("NIF not registered"))
    .mount(&server)
    .await;

  let result = client(&server, Duration::from_secs(5)).submit(&submission()).await;

  match result {
    Err(AuthorityError::Rejected { status, detail }) => {
      assert_eq!(status, 422);
      assert_eq!(detail, "NIF not registered");
    }
    other => panic!("expected rejection, got {:?}", other),
  }
}

#[tokio::test]
async fn test_server_error_is_transient() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
    .mount(&server)
    .await;

  let result = client(&server, Duration::from_secs(5)).submit(&submission()).await;

  assert!(matches!(result, Err(AuthorityError::Transient(_))));
}

#[tokio::test]
async fn test_timeout_is_transient() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
    .mount(&server)
    .await;

  let result = client(&server, Duration::from_millis(50)).submit(&submission()).await;

  assert!(matches!(result, Err(AuthorityError::Transient(_))));
}

#[tokio::test]
async fn test_unreachable_authority_is_transient() {
  let client = HttpAuthorityClient::new("http://127.0.0.1:1/records", Duration::from_secs(1)).unwrap();

  let result = client.submit(&submission()).await;

  assert!(matches!(result, Err(AuthorityError::Transient(_))));
}

#[tokio::test]
async fn test_service_retries_until_authority_recovers() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(502))
    .up_to_n_times(2)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .respond_with(ResponseTemplate::new(200))
    .mount(&server)
    .await;

  let ledger = TestLedger::new().await;
  let invoice = ledger.issue_invoice(dec!(100)).await;
  let service = IntegrityService::new(
    Arc::new(ledger.store.clone()),
    Arc::new(client(&server, Duration::from_secs(5))),
    fast_retry(),
  );

  let submitted = service.submit(ledger.tenant_id(), invoice.id).await.unwrap();

  assert_eq!(submitted.status, DocumentStatus::Submitted);
  assert_eq!(submitted.submission_attempts, 3);
  assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
