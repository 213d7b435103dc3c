pub mod bootstrap_series;
pub mod get_series;
pub mod list_series;
pub mod lock_series;

pub use bootstrap_series::{BootstrapSeriesCommand, BootstrapSeriesResponse, BootstrapSeriesUseCase};
pub use get_series::SeriesDto;
pub use list_series::{ListSeriesCommand, ListSeriesResponse, ListSeriesUseCase};
pub use lock_series::{LockSeriesCommand, LockSeriesUseCase};
