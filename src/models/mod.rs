//! Core data models for the query engine.

pub mod code;
pub mod record;

pub use code::{CodeInput, FormatError, RoutingCode};
pub use record::{GeoCandidate, PostOfficeRecord};
