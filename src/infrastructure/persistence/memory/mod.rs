pub mod ledger_store;
pub mod tax_rate_catalog;

pub use ledger_store::{MemoryLedgerStore, MemoryLedgerTransaction};
pub use tax_rate_catalog::MemoryTaxRateCatalog;
