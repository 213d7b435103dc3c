pub mod calculator;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use calculator::{DocumentTotals, LineAmounts};
pub use entities::{Document, DocumentHeader, DocumentLine, PricedLine};
pub use errors::{DocumentError, LifecycleError};
pub use ports::DocumentStore;
pub use services::{DocumentService, IssueDocumentData, LineInput};
pub use value_objects::{
  DocumentNumber, DocumentStatus, DocumentType, LineDescription, Quantity, UnitPrice, round_money,
};
