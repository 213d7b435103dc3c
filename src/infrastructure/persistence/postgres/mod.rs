pub mod chain_repository;
pub mod closure_repository;
pub mod document_repository;
pub mod ledger_store;
pub mod series_repository;
pub mod tax_rate_repository;
pub mod tenant_repository;

pub use ledger_store::{PgLedgerStore, PgLedgerTransaction};
pub use tax_rate_repository::PostgresTaxRateRepository;
