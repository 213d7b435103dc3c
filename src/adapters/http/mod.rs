pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use dtos::ErrorResponse;
pub use errors::ApiError;
pub use handlers::{ACTOR_HEADER, actor_id};
pub use middleware::{RequestId, RequestIdExt, RequestIdMiddleware};
pub use routes::{
  LedgerRouteDependencies, configure_closure_routes, configure_document_routes,
  configure_ledger_routes, configure_numbering_routes,
};
