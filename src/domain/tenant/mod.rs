pub mod entities;
pub mod ports;
pub mod value_objects;

pub use entities::Tenant;
pub use ports::TenantStore;
pub use value_objects::TaxId;
