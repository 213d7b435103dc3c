pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{
  AuthoritySubmission, ChainBreak, ChainBreakReason, ChainHead, ChainReport, IntegritySeal,
  VerificationPayload,
};
pub use errors::{AuthorityError, IntegrityError};
pub use ports::{AuthorityClient, ChainStore, QrRenderer};
pub use services::{
  IntegrityEngine, IntegrityService, SUBMISSION_CLAIM_TTL_MINUTES, SubmitPendingReport,
  compute_fingerprint, validate_chain, validate_fingerprint,
};
pub use value_objects::{ClassificationPolicy, DocumentClass, Fingerprint};
