//! Geospatial nearest-office search.
//!
//! A cheap bounding-box query against the record store narrows the
//! candidates; exact great-circle distances then filter and rank them.

mod bbox;
mod distance;
mod search;

pub use bbox::{BoundingBox, KM_PER_DEGREE};
pub use distance::{haversine_km, EARTH_RADIUS_KM};
pub use search::GeoSearch;
