pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{
  ClosureDetails, ClosureListing, ClosurePage, ClosureTotals, ClosureTransition, FiscalClosure,
  FiscalYearStatistics, QuarterStatistics, Reopening, ReportArtifacts, YearStatus,
};
pub use errors::{ClosureError, ONE_CLOSED_PER_YEAR_CONSTRAINT};
pub use ports::{ClosureStore, ReportExporter};
pub use services::{FiscalClosureManager, compute_closure_fingerprint};
pub use value_objects::{ClosureState, HistoryQuery, ReopenReason};
