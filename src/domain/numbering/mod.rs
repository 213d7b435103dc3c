pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{AllocatedNumber, NumberingSeries, SeriesKey};
pub use errors::NumberingError;
pub use ports::SeriesStore;
pub use services::{BootstrapOutcome, SequenceAllocator};
pub use value_objects::{FormatTemplate, SeriesCode, SeriesState};
