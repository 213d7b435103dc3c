pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{TaxRate, TaxRateSnapshot};
pub use errors::TaxError;
pub use ports::TaxRateRepository;
pub use services::TaxRuleResolver;
pub use value_objects::Percentage;
