//! Data module - dataset loading, metrics derivation and caching

mod cache;
mod loader;
pub mod metrics;

pub use cache::{global, load_data, LoadError, MetricsCache};
pub use loader::{DataLoader, LoaderError, SourceFormat, TableSource};
pub use metrics::{DerivedMetrics, MetricsDeriver, MetricsError, Transaction};
