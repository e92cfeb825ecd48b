// Service exports
pub mod cache;
pub mod catalog;
pub mod config_store;
pub mod defaults;
pub mod parameters;

pub use cache::{CacheError, CacheKey, CacheStats, ParameterCache};
pub use catalog::{CatalogError, CatalogStore, InMemoryCatalog, ProductId, ProductSummary};
pub use config_store::{
    ConfigStore, ConfigStoreError, FlightDiagnostics, InMemoryConfigStore, ParameterCategory,
    ParameterMap,
};
pub use parameters::{resolve_or_default, CalculationConfigProvider, Resolved};
