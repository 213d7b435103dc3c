use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::{IssueDocumentRequest, UpdateDraftRequest},
    errors::ApiError,
  },
  application::documents::*,
};

/// Issue an invoice or quote
/// POST /api/v1/tenants/{tenant_id}/documents
pub async fn issue_document_handler(
  path: web::Path<Uuid>,
  request: web::Json<IssueDocumentRequest>,
  use_case: web::Data<Arc<IssueDocumentUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let command = IssueDocumentCommand {
    tenant_id: path.into_inner(),
    document_type: request.document_type,
    series_code: request.series_code,
    customer_id: request.customer_id,
    issue_date: request.issue_date,
    lines: request.lines.into_iter().map(Into::into).collect(),
    withholding_percentage: request.withholding_percentage,
    rectifies: request.rectifies,
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Created().json(response))
}

/// GET /api/v1/tenants/{tenant_id}/documents/{document_id}
pub async fn get_document_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<GetDocumentUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (tenant_id, document_id) = path.into_inner();

  let response = use_case
    .execute(GetDocumentCommand {
      tenant_id,
      document_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Replace the lines of a draft and recompute its totals
/// PUT /api/v1/tenants/{tenant_id}/documents/{document_id}/lines
pub async fn update_draft_handler(
  path: web::Path<(Uuid, Uuid)>,
  request: web::Json<UpdateDraftRequest>,
  use_case: web::Data<Arc<UpdateDraftUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let (tenant_id, document_id) = path.into_inner();
  let command = UpdateDraftCommand {
    tenant_id,
    document_id,
    lines: request.into_inner().lines.into_iter().map(Into::into).collect(),
  };

  let response = use_case.execute(command).await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Delete a draft. Sealed documents are never deleted.
/// DELETE /api/v1/tenants/{tenant_id}/documents/{document_id}
pub async fn delete_draft_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<DeleteDraftUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (tenant_id, document_id) = path.into_inner();

  use_case
    .execute(DeleteDraftCommand {
      tenant_id,
      document_id,
    })
    .await?;

  Ok(HttpResponse::NoContent().finish())
}

/// Send one sealed invoice to the tax authority
/// POST /api/v1/tenants/{tenant_id}/documents/{document_id}/submit
pub async fn submit_invoice_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<SubmitInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (tenant_id, document_id) = path.into_inner();

  let response = use_case
    .execute(SubmitInvoiceCommand {
      tenant_id,
      document_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/tenants/{tenant_id}/documents/{document_id}/verification
pub async fn verification_payload_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<GetVerificationPayloadUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (tenant_id, document_id) = path.into_inner();

  let response = use_case
    .execute(GetVerificationPayloadCommand {
      tenant_id,
      document_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Retry every unsent invoice of the tenant
/// POST /api/v1/tenants/{tenant_id}/submissions/pending
pub async fn submit_pending_handler(
  path: web::Path<Uuid>,
  use_case: web::Data<Arc<SubmitPendingUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(SubmitPendingCommand {
      tenant_id: path.into_inner(),
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Walk the tenant's invoice chain
/// GET /api/v1/tenants/{tenant_id}/chain/verify
pub async fn verify_chain_handler(
  path: web::Path<Uuid>,
  use_case: web::Data<Arc<VerifyChainUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case
    .execute(VerifyChainCommand {
      tenant_id: path.into_inner(),
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}
