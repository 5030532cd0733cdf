//! Services for report aggregation, data loading and offline caching

pub mod aggregator;
pub mod cache;
pub mod data_loader;
pub mod network;
pub mod offline;
pub mod period;

pub use aggregator::{Aggregator, AggregatorOptions};
pub use cache::ResponseCacheStore;
pub use data_loader::{DataLoaderService, JsonFileStore, SalesStore};
pub use network::{Destination, HttpNetwork, Network, Request, Response};
pub use offline::{OfflineCache, OfflineOptions, WorkerMessage};
pub use period::ReportPeriod;
