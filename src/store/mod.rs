//! Record store: full post office records behind a read-only query trait.

mod memory;

use std::collections::BTreeSet;

use crate::models::{PostOfficeRecord, RoutingCode};
use crate::spatial::BoundingBox;

pub use memory::MemoryStore;

/// A record store query failed
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record store query failed: {0}")]
    Query(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Keyed, queryable access to post office records.
///
/// Implementations are shared as one long-lived `Arc<dyn RecordStore>` and
/// must be safe to query from many threads at once.
pub trait RecordStore: Send + Sync {
    /// All records for a code, possibly none
    fn get_by_code(&self, code: &RoutingCode) -> StoreResult<Vec<PostOfficeRecord>>;

    /// District names equal to `name`, or containing it when `fuzzy`.
    ///
    /// Both comparisons ignore case. Names are returned as stored, sorted
    /// and without duplicates.
    fn get_by_district(&self, name: &str, fuzzy: bool) -> StoreResult<BTreeSet<String>>;

    /// Records whose coordinates fall inside the box, bounds inclusive
    fn get_in_bounding_box(&self, bbox: &BoundingBox) -> StoreResult<Vec<PostOfficeRecord>>;

    /// Number of records held
    fn record_count(&self) -> StoreResult<usize>;
}

/// Case rule shared by district lookups
pub(crate) fn district_matches(district: &str, query_lower: &str, fuzzy: bool) -> bool {
    let district = district.to_lowercase();
    if fuzzy {
        district.contains(query_lower)
    } else {
        district == query_lower
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_district_matches() {
        assert!(district_matches("New Delhi", "delhi", true));
        assert!(!district_matches("New Delhi", "delhi", false));
        assert!(district_matches("New Delhi", "new delhi", false));
        assert!(district_matches("NEW DELHI", "new delhi", false));
        assert!(!district_matches("Mumbai", "delhi", true));
    }

    #[test]
    fn test_query_error_message() {
        let err = StoreError::Query("connection refused".into());
        assert_eq!(err.to_string(), "record store query failed: connection refused");
    }
}
