pub mod close_fiscal_year;
pub mod get_closure;
pub mod get_fiscal_statistics;
pub mod list_closures;
pub mod reopen_fiscal_year;

pub use close_fiscal_year::{CloseFiscalYearCommand, CloseFiscalYearUseCase};
pub use get_closure::{
  ClosureDetailsResponse, ClosureDto, ClosureTotalsDto, ClosureTransitionDto, GetClosureCommand,
  GetClosureUseCase,
};
pub use get_fiscal_statistics::{GetFiscalStatisticsCommand, GetFiscalStatisticsUseCase};
pub use list_closures::{ListClosuresCommand, ListClosuresResponse, ListClosuresUseCase};
pub use reopen_fiscal_year::{ReopenFiscalYearCommand, ReopenFiscalYearUseCase};
