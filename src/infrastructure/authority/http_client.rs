use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::domain::integrity::{AuthorityClient, AuthorityError, AuthoritySubmission};

/// JSON-over-HTTP client for the tax authority's record endpoint.
///
/// One call is one attempt; retries are driven by the caller's policy.
pub struct HttpAuthorityClient {
  endpoint: String,
  client: Client,
}

impl HttpAuthorityClient {
  pub fn new(endpoint: impl Into<String>, request_timeout: Duration) -> Result<Self, AuthorityError> {
    let client = Client::builder()
      .timeout(request_timeout)
      .build()
      .map_err(|e| AuthorityError::Transient(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      endpoint: endpoint.into(),
      client,
    })
  }
}

#[async_trait]
impl AuthorityClient for HttpAuthorityClient {
  async fn submit(&self, submission: &AuthoritySubmission) -> Result<(), AuthorityError> {
    let response = self
      .client
      .post(&self.endpoint)
      .json(submission)
      .send()
      .await
      .map_err(|e| {
        if e.is_timeout() {
          AuthorityError::Transient(format!("Authority request timed out: {}", e))
        } else {
          AuthorityError::Transient(format!("Failed to reach authority: {}", e))
        }
      })?;

    let status = response.status();
    if status.is_success() {
      tracing::debug!(
        number = %submission.document_number,
        status = status.as_u16(),
        "Authority accepted submission"
      );
      return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
      return Err(AuthorityError::Rejected {
        status: status.as_u16(),
        detail: body,
      });
    }

    Err(AuthorityError::Transient(format!(
      "Authority returned {}: {}",
      status, body
    )))
  }
}
