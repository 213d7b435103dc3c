pub mod closures;
pub mod documents;
pub mod numbering;

use crate::adapters::http::errors::ApiError;
use actix_web::HttpRequest;
use uuid::Uuid;

/// Header carrying the acting user, set by the gateway in front of the ledger.
pub const ACTOR_HEADER: &str = "X-User-Id";

/// Extract the acting user recorded on closure transitions
pub fn actor_id(req: &HttpRequest) -> Result<Uuid, ApiError> {
  let header = req.headers().get(ACTOR_HEADER).ok_or_else(|| {
    tracing::warn!("actor_id: {} missing for path {}", ACTOR_HEADER, req.path());
    ApiError::Validation(format!("{} header is required", ACTOR_HEADER))
  })?;

  header
    .to_str()
    .ok()
    .and_then(|value| Uuid::parse_str(value.trim()).ok())
    .ok_or_else(|| ApiError::Validation(format!("{} must be a UUID", ACTOR_HEADER)))
}
