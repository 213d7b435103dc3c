use actix_web::{HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::{BootstrapSeriesRequest, FiscalYearQuery, LockSeriesRequest},
    errors::ApiError,
  },
  application::numbering::*,
};

/// Create the default series for a fiscal year
/// POST /api/v1/tenants/{tenant_id}/series/bootstrap
pub async fn bootstrap_series_handler(
  path: web::Path<Uuid>,
  request: web::Json<BootstrapSeriesRequest>,
  use_case: web::Data<Arc<BootstrapSeriesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let response = use_case
    .execute(BootstrapSeriesCommand {
      tenant_id: path.into_inner(),
      fiscal_year: request.fiscal_year,
    })
    .await?;

  if response.created.is_empty() {
    return Ok(HttpResponse::Ok().json(response));
  }
  Ok(HttpResponse::Created().json(response))
}

/// GET /api/v1/tenants/{tenant_id}/series?fiscal_year=2024
pub async fn list_series_handler(
  path: web::Path<Uuid>,
  query: web::Query<FiscalYearQuery>,
  use_case: web::Data<Arc<ListSeriesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  query.validate()?;

  let response = use_case
    .execute(ListSeriesCommand {
      tenant_id: path.into_inner(),
      fiscal_year: query.fiscal_year,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Lock a series so no further numbers are allocated from it
/// POST /api/v1/tenants/{tenant_id}/series/lock
pub async fn lock_series_handler(
  path: web::Path<Uuid>,
  request: web::Json<LockSeriesRequest>,
  use_case: web::Data<Arc<LockSeriesUseCase>>,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let request = request.into_inner();
  let response = use_case
    .execute(LockSeriesCommand {
      tenant_id: path.into_inner(),
      code: request.code,
      document_type: request.document_type,
      fiscal_year: request.fiscal_year,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}
