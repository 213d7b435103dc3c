pub mod closure;
pub mod document;
pub mod errors;
pub mod integrity;
pub mod numbering;
pub mod retry;
pub mod tax;
pub mod tenant;
pub mod unit_of_work;

pub use errors::{ErrorCategory, StorageError, ValueObjectError};
pub use unit_of_work::{LedgerStore, LedgerTransaction};
