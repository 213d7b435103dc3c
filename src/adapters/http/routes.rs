use actix_web::web;
use std::sync::Arc;

use crate::application::closures::{
  CloseFiscalYearUseCase, GetClosureUseCase, GetFiscalStatisticsUseCase, ListClosuresUseCase,
  ReopenFiscalYearUseCase,
};
use crate::application::documents::{
  DeleteDraftUseCase, GetDocumentUseCase, GetVerificationPayloadUseCase, IssueDocumentUseCase,
  SubmitInvoiceUseCase, SubmitPendingUseCase, UpdateDraftUseCase, VerifyChainUseCase,
};
use crate::application::numbering::{BootstrapSeriesUseCase, ListSeriesUseCase, LockSeriesUseCase};

use super::handlers::{closures, documents, numbering};

/// Use cases served under `/api/v1/tenants/{tenant_id}`
#[derive(Clone)]
pub struct LedgerRouteDependencies {
  // Document use cases
  pub issue_document_use_case: Arc<IssueDocumentUseCase>,
  pub get_document_use_case: Arc<GetDocumentUseCase>,
  pub update_draft_use_case: Arc<UpdateDraftUseCase>,
  pub delete_draft_use_case: Arc<DeleteDraftUseCase>,
  pub submit_invoice_use_case: Arc<SubmitInvoiceUseCase>,
  pub submit_pending_use_case: Arc<SubmitPendingUseCase>,
  pub verify_chain_use_case: Arc<VerifyChainUseCase>,
  pub verification_payload_use_case: Arc<GetVerificationPayloadUseCase>,
  // Numbering use cases
  pub bootstrap_series_use_case: Arc<BootstrapSeriesUseCase>,
  pub list_series_use_case: Arc<ListSeriesUseCase>,
  pub lock_series_use_case: Arc<LockSeriesUseCase>,
  // Closure use cases
  pub fiscal_statistics_use_case: Arc<GetFiscalStatisticsUseCase>,
  pub close_fiscal_year_use_case: Arc<CloseFiscalYearUseCase>,
  pub list_closures_use_case: Arc<ListClosuresUseCase>,
  pub get_closure_use_case: Arc<GetClosureUseCase>,
  pub reopen_fiscal_year_use_case: Arc<ReopenFiscalYearUseCase>,
}

/// Configure every tenant-scoped ledger route
///
/// Mount inside a scope whose path captures `{tenant_id}`.
///
/// # Example
///
/// ```no_run
/// use actix_web::{App, web};
/// # use taxledger::adapters::http::routes::{LedgerRouteDependencies, configure_ledger_routes};
///
/// # fn example(deps: LedgerRouteDependencies) {
/// let app = App::new().service(
///   web::scope("/api/v1/tenants/{tenant_id}")
///     .configure(|cfg| configure_ledger_routes(cfg, deps.clone())),
/// );
/// # }
/// ```
pub fn configure_ledger_routes(cfg: &mut web::ServiceConfig, deps: LedgerRouteDependencies) {
  configure_document_routes(cfg, &deps);
  configure_numbering_routes(cfg, &deps);
  configure_closure_routes(cfg, &deps);
}

/// Configure document routes
///
/// # Routes
///
/// - POST /documents - Issue an invoice or quote
/// - GET /documents/{document_id} - Document with lines, totals and seal
/// - PUT /documents/{document_id}/lines - Replace the lines of a draft
/// - DELETE /documents/{document_id} - Delete a draft
/// - POST /documents/{document_id}/submit - Send a sealed invoice to the authority
/// - GET /documents/{document_id}/verification - Verification URL and QR code
/// - POST /submissions/pending - Retry all unsent invoices
/// - GET /chain/verify - Validate the invoice chain
pub fn configure_document_routes(cfg: &mut web::ServiceConfig, deps: &LedgerRouteDependencies) {
  cfg
    .app_data(web::Data::new(deps.issue_document_use_case.clone()))
    .app_data(web::Data::new(deps.get_document_use_case.clone()))
    .app_data(web::Data::new(deps.update_draft_use_case.clone()))
    .app_data(web::Data::new(deps.delete_draft_use_case.clone()))
    .app_data(web::Data::new(deps.submit_invoice_use_case.clone()))
    .app_data(web::Data::new(deps.submit_pending_use_case.clone()))
    .app_data(web::Data::new(deps.verify_chain_use_case.clone()))
    .app_data(web::Data::new(deps.verification_payload_use_case.clone()))
    .route("/documents", web::post().to(documents::issue_document_handler))
    .route(
      "/documents/{document_id}",
      web::get().to(documents::get_document_handler),
    )
    .route(
      "/documents/{document_id}",
      web::delete().to(documents::delete_draft_handler),
    )
    .route(
      "/documents/{document_id}/lines",
      web::put().to(documents::update_draft_handler),
    )
    .route(
      "/documents/{document_id}/submit",
      web::post().to(documents::submit_invoice_handler),
    )
    .route(
      "/documents/{document_id}/verification",
      web::get().to(documents::verification_payload_handler),
    )
    .route(
      "/submissions/pending",
      web::post().to(documents::submit_pending_handler),
    )
    .route("/chain/verify", web::get().to(documents::verify_chain_handler));
}

/// Configure numbering series routes
///
/// # Routes
///
/// - POST /series/bootstrap - Create the default series of a year
/// - GET /series?fiscal_year= - List the series of a year
/// - POST /series/lock - Lock a series
pub fn configure_numbering_routes(cfg: &mut web::ServiceConfig, deps: &LedgerRouteDependencies) {
  cfg
    .app_data(web::Data::new(deps.bootstrap_series_use_case.clone()))
    .app_data(web::Data::new(deps.list_series_use_case.clone()))
    .app_data(web::Data::new(deps.lock_series_use_case.clone()))
    .route(
      "/series/bootstrap",
      web::post().to(numbering::bootstrap_series_handler),
    )
    .route("/series", web::get().to(numbering::list_series_handler))
    .route("/series/lock", web::post().to(numbering::lock_series_handler));
}

/// Configure fiscal closure routes
///
/// # Routes
///
/// - GET /fiscal-years/{year}/statistics - Quarter figures and closability
/// - POST /closures - Close a fiscal year (requires `X-User-Id`)
/// - GET /closures - Closure history, newest first
/// - GET /closures/{closure_id} - Closure with its transitions
/// - POST /closures/{closure_id}/reopen - Reopen with a reason (requires `X-User-Id`)
pub fn configure_closure_routes(cfg: &mut web::ServiceConfig, deps: &LedgerRouteDependencies) {
  cfg
    .app_data(web::Data::new(deps.fiscal_statistics_use_case.clone()))
    .app_data(web::Data::new(deps.close_fiscal_year_use_case.clone()))
    .app_data(web::Data::new(deps.list_closures_use_case.clone()))
    .app_data(web::Data::new(deps.get_closure_use_case.clone()))
    .app_data(web::Data::new(deps.reopen_fiscal_year_use_case.clone()))
    .route(
      "/fiscal-years/{fiscal_year}/statistics",
      web::get().to(closures::fiscal_statistics_handler),
    )
    .route("/closures", web::post().to(closures::close_fiscal_year_handler))
    .route("/closures", web::get().to(closures::list_closures_handler))
    .route(
      "/closures/{closure_id}",
      web::get().to(closures::get_closure_handler),
    )
    .route(
      "/closures/{closure_id}/reopen",
      web::post().to(closures::reopen_closure_handler),
    );
}
