use actix_web::{HttpRequest, HttpResponse, web};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::actor_id;
use crate::{
  adapters::http::{
    dtos::{ClosureHistoryQuery, CloseFiscalYearRequest, ReopenClosureRequest},
    errors::ApiError,
  },
  application::closures::*,
};

/// Per-quarter figures and closability of a fiscal year
/// GET /api/v1/tenants/{tenant_id}/fiscal-years/{year}/statistics
pub async fn fiscal_statistics_handler(
  path: web::Path<(Uuid, i32)>,
  use_case: web::Data<Arc<GetFiscalStatisticsUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (tenant_id, fiscal_year) = path.into_inner();

  let statistics = use_case
    .execute(GetFiscalStatisticsCommand {
      tenant_id,
      fiscal_year,
    })
    .await?;

  Ok(HttpResponse::Ok().json(statistics))
}

/// Close a fiscal year
/// POST /api/v1/tenants/{tenant_id}/closures
pub async fn close_fiscal_year_handler(
  path: web::Path<Uuid>,
  request: web::Json<CloseFiscalYearRequest>,
  use_case: web::Data<Arc<CloseFiscalYearUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let actor = actor_id(&http_req)?;

  let closure = use_case
    .execute(CloseFiscalYearCommand {
      tenant_id: path.into_inner(),
      fiscal_year: request.fiscal_year,
      actor,
    })
    .await?;

  Ok(HttpResponse::Created().json(closure))
}

/// Paginated closure history, newest first
/// GET /api/v1/tenants/{tenant_id}/closures?page=1&page_size=20&as_of=42
pub async fn list_closures_handler(
  path: web::Path<Uuid>,
  query: web::Query<ClosureHistoryQuery>,
  use_case: web::Data<Arc<ListClosuresUseCase>>,
) -> Result<HttpResponse, ApiError> {
  query.validate()?;

  let query = query.into_inner();
  let response = use_case
    .execute(ListClosuresCommand {
      tenant_id: path.into_inner(),
      page: query.page,
      page_size: query.page_size,
      fiscal_year: query.fiscal_year,
      as_of: query.as_of,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// GET /api/v1/tenants/{tenant_id}/closures/{closure_id}
pub async fn get_closure_handler(
  path: web::Path<(Uuid, Uuid)>,
  use_case: web::Data<Arc<GetClosureUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let (tenant_id, closure_id) = path.into_inner();

  let response = use_case
    .execute(GetClosureCommand {
      tenant_id,
      closure_id,
    })
    .await?;

  Ok(HttpResponse::Ok().json(response))
}

/// Reopen a closed fiscal year with a mandatory reason
/// POST /api/v1/tenants/{tenant_id}/closures/{closure_id}/reopen
pub async fn reopen_closure_handler(
  path: web::Path<(Uuid, Uuid)>,
  request: web::Json<ReopenClosureRequest>,
  use_case: web::Data<Arc<ReopenFiscalYearUseCase>>,
  http_req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
  request.validate()?;

  let actor = actor_id(&http_req)?;
  let (tenant_id, closure_id) = path.into_inner();

  let closure = use_case
    .execute(ReopenFiscalYearCommand {
      tenant_id,
      closure_id,
      reason: request.into_inner().reason,
      actor,
    })
    .await?;

  Ok(HttpResponse::Ok().json(closure))
}
