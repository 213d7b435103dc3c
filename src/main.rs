use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxledger::{
  adapters::http::{LedgerRouteDependencies, RequestIdMiddleware, configure_ledger_routes},
  application::closures::{
    CloseFiscalYearUseCase, GetClosureUseCase, GetFiscalStatisticsUseCase, ListClosuresUseCase,
    ReopenFiscalYearUseCase,
  },
  application::documents::{
    DeleteDraftUseCase, GetDocumentUseCase, GetVerificationPayloadUseCase, IssueDocumentUseCase,
    SubmitInvoiceUseCase, SubmitPendingUseCase, UpdateDraftUseCase, VerifyChainUseCase,
  },
  application::numbering::{BootstrapSeriesUseCase, ListSeriesUseCase, LockSeriesUseCase},
  domain::LedgerStore,
  domain::closure::FiscalClosureManager,
  domain::document::DocumentService,
  domain::integrity::{IntegrityEngine, IntegrityService},
  domain::numbering::{FormatTemplate, SequenceAllocator},
  domain::tax::TaxRuleResolver,
  infrastructure::{
    authority::HttpAuthorityClient,
    config::Config,
    persistence::postgres::{PgLedgerStore, PostgresTaxRateRepository},
    qr::PngQrRenderer,
    reports::CsvReportExporter,
  },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  // Initialize environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taxledger=debug,actix_web=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tracing::info!("Starting TaxLedger");

  let config = Config::load().context("Failed to load configuration")?;
  tracing::info!("Configuration loaded successfully");

  // Set up database connection pool with timeout
  let db_pool = tokio::time::timeout(
    Duration::from_secs(config.database.connect_timeout_seconds),
    PgPoolOptions::new()
      .max_connections(config.database.max_connections)
      .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_seconds))
      .connect(&config.database.url),
  )
  .await
  .map_err(|_| {
    tracing::error!(
      "Database connection timed out after {} seconds. Is PostgreSQL running?",
      config.database.connect_timeout_seconds
    );
    anyhow::anyhow!(
      "Database connection timed out after {} seconds",
      config.database.connect_timeout_seconds
    )
  })?
  .context("Failed to connect to database")?;

  tracing::info!("Database connection pool created");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .context("Failed to run database migrations")?;
  tracing::info!("Database migrations completed");

  // Ledger ports
  let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(db_pool.clone()));
  let tax_rates = Arc::new(PostgresTaxRateRepository::new(db_pool.clone()));
  let authority = Arc::new(
    HttpAuthorityClient::new(
      config.authority.endpoint.clone(),
      Duration::from_millis(config.authority.request_timeout_ms),
    )
    .context("Failed to build authority client")?,
  );
  let exporter = Arc::new(CsvReportExporter::new(config.reports.output_dir.clone()));

  // Domain services
  let format_template = FormatTemplate::new(config.numbering.format_template.clone())
    .context("Invalid numbering.format_template")?;
  let allocator = Arc::new(SequenceAllocator::new(
    store.clone(),
    format_template,
    config.numbering.padding_width,
  ));
  let tax_resolver = Arc::new(TaxRuleResolver::new(tax_rates));
  let integrity_engine = Arc::new(IntegrityEngine::new(
    config.integrity.classification_policy(),
    config.integrity.verification_base_url.clone(),
    Arc::new(PngQrRenderer::new()),
  ));
  let integrity_service = Arc::new(IntegrityService::new(
    store.clone(),
    authority,
    config.authority.retry_policy(),
  ));
  let document_service = Arc::new(DocumentService::new(
    store.clone(),
    tax_resolver,
    allocator.clone(),
    integrity_engine.clone(),
  ));
  let closure_manager = Arc::new(FiscalClosureManager::new(store.clone(), exporter));

  let routes = LedgerRouteDependencies {
    issue_document_use_case: Arc::new(IssueDocumentUseCase::new(document_service.clone())),
    get_document_use_case: Arc::new(GetDocumentUseCase::new(document_service.clone())),
    update_draft_use_case: Arc::new(UpdateDraftUseCase::new(document_service.clone())),
    delete_draft_use_case: Arc::new(DeleteDraftUseCase::new(document_service.clone())),
    submit_invoice_use_case: Arc::new(SubmitInvoiceUseCase::new(integrity_service.clone())),
    submit_pending_use_case: Arc::new(SubmitPendingUseCase::new(integrity_service.clone())),
    verify_chain_use_case: Arc::new(VerifyChainUseCase::new(integrity_service.clone())),
    verification_payload_use_case: Arc::new(GetVerificationPayloadUseCase::new(
      document_service.clone(),
      integrity_engine.clone(),
    )),
    bootstrap_series_use_case: Arc::new(BootstrapSeriesUseCase::new(allocator.clone())),
    list_series_use_case: Arc::new(ListSeriesUseCase::new(allocator.clone())),
    lock_series_use_case: Arc::new(LockSeriesUseCase::new(allocator.clone())),
    fiscal_statistics_use_case: Arc::new(GetFiscalStatisticsUseCase::new(closure_manager.clone())),
    close_fiscal_year_use_case: Arc::new(CloseFiscalYearUseCase::new(closure_manager.clone())),
    list_closures_use_case: Arc::new(ListClosuresUseCase::new(closure_manager.clone())),
    get_closure_use_case: Arc::new(GetClosureUseCase::new(closure_manager.clone())),
    reopen_fiscal_year_use_case: Arc::new(ReopenFiscalYearUseCase::new(closure_manager)),
  };

  spawn_resubmission_sweep(
    integrity_service,
    config.authority.resubmit_interval_seconds,
  );

  let server_host = config.server.host.clone();
  let server_port = config.server.port;

  tracing::info!("Starting HTTP server on {}:{}", server_host, server_port);

  HttpServer::new(move || {
    App::new()
      .wrap(RequestIdMiddleware::new())
      .wrap(Logger::default())
      .service(
        web::scope("/api/v1/tenants/{tenant_id}")
          .configure(|cfg| configure_ledger_routes(cfg, routes.clone())),
      )
      .route("/health", web::get().to(health_check))
  })
  .bind((server_host.as_str(), server_port))?
  .run()
  .await?;

  Ok(())
}

/// Periodically retry unsent invoices of every tenant.
fn spawn_resubmission_sweep(integrity_service: Arc<IntegrityService>, interval_seconds: u64) {
  if interval_seconds == 0 {
    tracing::info!("Background resubmission disabled");
    return;
  }

  tokio::spawn(async move {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      interval.tick().await;
      match integrity_service.submit_all_pending().await {
        Ok(report) if report.submitted + report.failed > 0 => tracing::info!(
          submitted = report.submitted,
          failed = report.failed,
          "Resubmission sweep finished"
        ),
        Ok(_) => {}
        Err(e) => tracing::error!("Resubmission sweep failed: {}", e),
      }
    }
  });
}

/// Health check endpoint
async fn health_check() -> &'static str {
  "OK"
}
