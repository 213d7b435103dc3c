//! Application layer
//!
//! Use cases translate raw commands into validated domain input, call the
//! ledger services and shape their results into response DTOs.

pub mod closures;
pub mod documents;
pub mod numbering;
