//! Pinpoint - postal routing code validation and nearby post office search.
//!
//! This library provides the query engine shared by the `query` server and
//! any embedding application.

pub mod config;
pub mod engine;
pub mod index;
pub mod models;
pub mod snapshot;
pub mod spatial;
pub mod store;

pub use config::{Config, DataConfig};
pub use engine::{QueryEngine, DEFAULT_RADIUS_KM};
pub use index::ValidationIndex;
pub use models::{CodeInput, FormatError, GeoCandidate, PostOfficeRecord, RoutingCode};
pub use store::{MemoryStore, RecordStore, StoreError};
