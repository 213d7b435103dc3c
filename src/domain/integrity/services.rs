use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::entities::{
  AuthoritySubmission, ChainBreak, ChainBreakReason, ChainHead, ChainReport, IntegritySeal,
  VerificationPayload,
};
use super::errors::{AuthorityError, IntegrityError};
use super::ports::{AuthorityClient, QrRenderer};
use super::value_objects::{ClassificationPolicy, DocumentClass, Fingerprint};
use crate::domain::document::Document;
use crate::domain::retry::{RetryFailure, RetryPolicy, call_with_retry};
use crate::domain::unit_of_work::{LedgerStore, LedgerTransaction};

/// Canonical, order-sensitive input of an invoice fingerprint.
pub fn canonical_invoice_string(document: &Document, previous: Option<&Fingerprint>) -> String {
  format!(
    "issuer={}&number={}&date={}&tax={:.2}&total={:.2}&previous={}",
    document.issuer_tax_id.value(),
    document.number.value(),
    document.issue_date.format("%Y-%m-%d"),
    document.totals.tax_total,
    document.totals.grand_total,
    previous.map(Fingerprint::value).unwrap_or_default(),
  )
}

pub fn compute_fingerprint(
  document: Option<&Document>,
  previous: Option<&Fingerprint>,
) -> Result<Fingerprint, IntegrityError> {
  let document = document.ok_or(IntegrityError::NullDocument)?;
  Ok(Fingerprint::digest(&canonical_invoice_string(document, previous)))
}

pub fn validate_fingerprint(
  document: &Document,
  previous: Option<&Fingerprint>,
  claimed: &Fingerprint,
) -> bool {
  Fingerprint::digest(&canonical_invoice_string(document, previous)) == *claimed
}

/// Check every link of a chain given in chain order. Stops at the first break.
pub fn validate_chain(documents: &[Document]) -> ChainReport {
  let mut previous: Option<&Fingerprint> = None;

  for (index, document) in documents.iter().enumerate() {
    let position = index as i64 + 1;
    let broken = |reason| ChainReport {
      checked: index + 1,
      first_break: Some(ChainBreak {
        position,
        document_id: document.id,
        reason,
      }),
    };

    let Some(seal) = document.seal.as_ref() else {
      return broken(ChainBreakReason::MissingSeal);
    };
    if seal.chain_position != position {
      return broken(ChainBreakReason::PositionMismatch);
    }
    if seal.previous_fingerprint.as_ref() != previous {
      return broken(ChainBreakReason::LinkMismatch);
    }
    if !document.amounts_consistent() {
      return broken(ChainBreakReason::AmountsMismatch);
    }
    if !validate_fingerprint(document, previous, &seal.fingerprint) {
      return broken(ChainBreakReason::FingerprintMismatch);
    }
    previous = Some(&seal.fingerprint);
  }

  ChainReport {
    checked: documents.len(),
    first_break: None,
  }
}

/// Pure integrity operations plus sealing inside an issuing unit of work.
pub struct IntegrityEngine {
  policy: ClassificationPolicy,
  verification_base_url: String,
  qr_renderer: Arc<dyn QrRenderer>,
}

impl IntegrityEngine {
  pub fn new(
    policy: ClassificationPolicy,
    verification_base_url: impl Into<String>,
    qr_renderer: Arc<dyn QrRenderer>,
  ) -> Self {
    Self {
      policy,
      verification_base_url: verification_base_url.into(),
      qr_renderer,
    }
  }

  pub fn policy(&self) -> &ClassificationPolicy {
    &self.policy
  }

  pub fn classify_document(&self, grand_total: Decimal, rectifying: bool) -> DocumentClass {
    self.policy.classify(grand_total, rectifying)
  }

  pub fn verification_url(&self, issuer_tax_id: &str, number: &str, fingerprint: &Fingerprint) -> String {
    format!(
      "{}?nif={}&numserie={}&huella={}",
      self.verification_base_url,
      urlencoding::encode(issuer_tax_id),
      urlencoding::encode(number),
      urlencoding::encode(fingerprint.value()),
    )
  }

  /// Verification URL and QR code of a sealed invoice.
  pub fn generate_verification_payload(
    &self,
    document: Option<&Document>,
  ) -> Result<VerificationPayload, IntegrityError> {
    let document = document.ok_or(IntegrityError::NullDocument)?;
    let seal = document
      .seal
      .as_ref()
      .ok_or(IntegrityError::NotSealed(document.id))?;
    self.payload_for(document, &seal.fingerprint)
  }

  fn payload_for(
    &self,
    document: &Document,
    fingerprint: &Fingerprint,
  ) -> Result<VerificationPayload, IntegrityError> {
    let url = self.verification_url(
      document.issuer_tax_id.value(),
      document.number.value(),
      fingerprint,
    );
    let png = self.qr_renderer.render_png(&url)?;
    let base64 = STANDARD.encode(&png);
    Ok(VerificationPayload { url, png, base64 })
  }

  /// Link `document` to the tenant's chain head and attach its seal.
  ///
  /// The chain head is read under lock in `tx`; the returned head must be
  /// saved in the same unit of work after the document row exists.
  pub async fn seal_in(
    &self,
    tx: &mut dyn LedgerTransaction,
    document: &mut Document,
  ) -> Result<ChainHead, IntegrityError> {
    if !document.is_invoice() {
      return Err(IntegrityError::NotAnInvoice(document.id));
    }

    let mut head = tx
      .lock_chain_head(document.tenant_id)
      .await?
      .unwrap_or_else(|| ChainHead::empty(document.tenant_id));

    let previous = head.last_fingerprint.clone();
    let fingerprint = compute_fingerprint(Some(document), previous.as_ref())?;
    let class = self.classify_document(document.totals.grand_total, document.is_rectifying());
    let payload = self.payload_for(document, &fingerprint)?;

    document.seal(IntegritySeal {
      fingerprint: fingerprint.clone(),
      previous_fingerprint: previous,
      document_class: class,
      class_code: self.policy.code_for(class).to_string(),
      verification_url: payload.url,
      qr_payload: payload.base64,
      chain_position: head.next_position(),
      sealed_at: Utc::now(),
    })?;
    head.advance(document.id, fingerprint);

    Ok(head)
  }
}

/// How long a `submitting` claim is honoured before the sweep takes it over.
/// Must exceed the longest retry schedule plus request timeouts.
pub const SUBMISSION_CLAIM_TTL_MINUTES: i64 = 15;

enum Claim {
  AlreadySent(Document),
  Claimed(Document),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitPendingReport {
  pub submitted: usize,
  pub failed: usize,
}

/// Authority submission and chain audits. Runs outside numbering transactions.
pub struct IntegrityService {
  store: Arc<dyn LedgerStore>,
  authority: Arc<dyn AuthorityClient>,
  retry_policy: RetryPolicy,
}

impl IntegrityService {
  pub fn new(
    store: Arc<dyn LedgerStore>,
    authority: Arc<dyn AuthorityClient>,
    retry_policy: RetryPolicy,
  ) -> Self {
    Self {
      store,
      authority,
      retry_policy,
    }
  }

  /// Claims older than this are presumed abandoned and can be taken over.
  fn stale_claims_before(&self) -> DateTime<Utc> {
    Utc::now() - TimeDelta::minutes(SUBMISSION_CLAIM_TTL_MINUTES)
  }

  /// Move the invoice to `submitting` under a row lock, so one caller at a time
  /// talks to the authority about it.
  async fn claim(&self, tenant_id: Uuid, document_id: Uuid) -> Result<Claim, IntegrityError> {
    let mut tx = self.store.begin().await?;
    let mut document = tx
      .lock_document(tenant_id, document_id)
      .await?
      .ok_or(IntegrityError::DocumentNotFound(document_id))?;
    if !document.is_invoice() {
      return Err(IntegrityError::NotAnInvoice(document_id));
    }
    if document.seal.is_none() {
      return Err(IntegrityError::NotSealed(document_id));
    }
    if document.is_sent() {
      return Ok(Claim::AlreadySent(document));
    }
    if document.has_live_claim(self.stale_claims_before()) {
      return Err(IntegrityError::SubmissionInProgress(document_id));
    }

    document.begin_submission()?;
    tx.update_document(&document).await?;
    tx.commit().await?;
    Ok(Claim::Claimed(document))
  }

  /// Send a sealed invoice to the authority, retrying transient failures.
  ///
  /// Already submitted invoices are returned unchanged. A 4xx answer marks the
  /// invoice `rejected`; the sweep leaves it alone until it is submitted again
  /// explicitly.
  pub async fn submit(&self, tenant_id: Uuid, document_id: Uuid) -> Result<Document, IntegrityError> {
    let document = match self.claim(tenant_id, document_id).await? {
      Claim::AlreadySent(document) => return Ok(document),
      Claim::Claimed(document) => document,
    };
    let submission = build_submission(&document)?;

    let outcome = call_with_retry(&self.retry_policy, AuthorityError::is_retryable, |attempt| {
      let submission = &submission;
      async move {
        let result = self.authority.submit(submission).await;
        if let Err(err) = &result {
          warn!(
            document_id = %document_id,
            attempt,
            error = %err,
            "Authority submission attempt failed"
          );
        }
        result
      }
    })
    .await;

    let mut tx = self.store.begin().await?;
    let mut document = tx
      .lock_document(tenant_id, document_id)
      .await?
      .ok_or(IntegrityError::DocumentNotFound(document_id))?;
    if document.is_sent() {
      // A caller that took over an expired claim got there first
      return Ok(document);
    }

    match outcome {
      Ok(retried) => {
        document.mark_submitted(Utc::now(), retried.attempts)?;
        tx.update_document(&document).await?;
        tx.commit().await?;
        info!(
          tenant_id = %tenant_id,
          document_id = %document_id,
          number = %document.number,
          attempts = retried.attempts,
          "Invoice accepted by authority"
        );
        Ok(document)
      }
      Err(RetryFailure {
        error: AuthorityError::Rejected { status, detail },
        attempts,
        ..
      }) => {
        document.mark_rejected(format!("{}: {}", status, detail), attempts)?;
        tx.update_document(&document).await?;
        tx.commit().await?;
        warn!(
          tenant_id = %tenant_id,
          document_id = %document_id,
          status,
          detail = %detail,
          "Invoice rejected by authority"
        );
        Err(IntegrityError::AuthorityRejected { status, detail })
      }
      Err(RetryFailure {
        error: AuthorityError::Transient(message),
        attempts,
        ..
      }) => {
        document.mark_submission_failed(message.clone(), attempts)?;
        tx.update_document(&document).await?;
        tx.commit().await?;
        warn!(
          tenant_id = %tenant_id,
          document_id = %document_id,
          attempts,
          error = %message,
          "Invoice submission failed"
        );
        Err(IntegrityError::SubmissionFailed {
          attempts,
          last_error: message,
        })
      }
    }
  }

  /// Resubmit every sealed invoice of the tenant that is not yet accepted.
  pub async fn submit_pending(&self, tenant_id: Uuid) -> Result<SubmitPendingReport, IntegrityError> {
    let pending: Vec<Uuid> = {
      let mut tx = self.store.begin().await?;
      tx.unsent_invoices(tenant_id, self.stale_claims_before())
        .await?
        .into_iter()
        .map(|document| document.id)
        .collect()
    };

    let mut report = SubmitPendingReport::default();
    for document_id in pending {
      match self.submit(tenant_id, document_id).await {
        Ok(_) => report.submitted += 1,
        Err(IntegrityError::Storage(err)) => return Err(IntegrityError::Storage(err)),
        // Another submitter holds it
        Err(IntegrityError::SubmissionInProgress(_)) => {}
        Err(_) => report.failed += 1,
      }
    }

    if report.submitted + report.failed > 0 {
      info!(
        tenant_id = %tenant_id,
        submitted = report.submitted,
        failed = report.failed,
        "Pending submissions processed"
      );
    }
    Ok(report)
  }

  /// Run [`IntegrityService::submit_pending`] for every tenant with unsent invoices.
  pub async fn submit_all_pending(&self) -> Result<SubmitPendingReport, IntegrityError> {
    let tenants = {
      let mut tx = self.store.begin().await?;
      tx.tenants_with_unsent_invoices(self.stale_claims_before())
        .await?
    };

    let mut total = SubmitPendingReport::default();
    for tenant_id in tenants {
      let report = self.submit_pending(tenant_id).await?;
      total.submitted += report.submitted;
      total.failed += report.failed;
    }
    Ok(total)
  }

  /// Validate the tenant's whole chain. Breaks are logged, never repaired.
  pub async fn verify_tenant_chain(&self, tenant_id: Uuid) -> Result<ChainReport, IntegrityError> {
    let documents = {
      let mut tx = self.store.begin().await?;
      tx.invoices_in_chain_order(tenant_id).await?
    };
    let report = validate_chain(&documents);

    match &report.first_break {
      Some(chain_break) => {
        let document = documents.iter().find(|d| d.id == chain_break.document_id);
        error!(
          tenant_id = %tenant_id,
          position = chain_break.position,
          document_id = %chain_break.document_id,
          number = document.map(|d| d.number.value()).unwrap_or_default(),
          reason = chain_break.reason.as_str(),
          checked = report.checked,
          "Invoice chain broken"
        );
      }
      None => info!(tenant_id = %tenant_id, checked = report.checked, "Invoice chain verified"),
    }

    Ok(report)
  }
}

fn build_submission(document: &Document) -> Result<AuthoritySubmission, IntegrityError> {
  let seal = document
    .seal
    .as_ref()
    .ok_or(IntegrityError::NotSealed(document.id))?;

  Ok(AuthoritySubmission {
    issuer_tax_id: document.issuer_tax_id.value().to_string(),
    document_number: document.number.value().to_string(),
    issue_date: document.issue_date,
    document_class: seal.class_code.clone(),
    taxable_base: document.totals.taxable_base,
    tax_total: document.totals.tax_total,
    surcharge_total: document.totals.surcharge_total,
    withholding: document.totals.withholding,
    grand_total: document.totals.grand_total,
    fingerprint: seal.fingerprint.value().to_string(),
    previous_fingerprint: seal
      .previous_fingerprint
      .as_ref()
      .map(|f| f.value().to_string()),
    chain_position: seal.chain_position,
    rectified_document_id: document.rectifies,
  })
}
