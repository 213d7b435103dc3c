//! Infrastructure layer
//!
//! Concrete adapters behind the domain ports: PostgreSQL and in-memory
//! ledger stores, the tax authority HTTP client, QR rendering and closure
//! report export.

pub mod authority;
pub mod config;
pub mod persistence;
pub mod qr;
pub mod reports;
