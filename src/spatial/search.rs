//! Radius search: bounding-box prefilter, then exact haversine ranking.

use geo::Point;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use super::{haversine_km, BoundingBox};
use crate::models::GeoCandidate;
use crate::store::{RecordStore, StoreResult};

/// Nearby-office search over a record store
#[derive(Clone)]
pub struct GeoSearch {
    store: Arc<dyn RecordStore>,
}

impl GeoSearch {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Offices within `radius_km` of (`lat`, `lng`), closest first.
    ///
    /// Invalid coordinates or a negative radius give an empty result. A zero
    /// radius keeps only offices exactly at the query point. Equal distances
    /// are ordered by code, then office name.
    pub fn find_nearby(&self, lat: f64, lng: f64, radius_km: f64) -> StoreResult<Vec<GeoCandidate>> {
        if !valid_query(lat, lng, radius_km) {
            debug!(
                "Rejected nearby query at ({}, {}) with radius {}",
                lat, lng, radius_km
            );
            return Ok(Vec::new());
        }

        let center = Point::new(lng, lat);
        let mut results = Vec::new();
        let mut scanned = 0usize;
        let mut skipped = 0usize;

        for bbox in BoundingBox::around(center, radius_km) {
            let candidates = self.store.get_in_bounding_box(&bbox)?;
            scanned += candidates.len();

            for record in candidates {
                let Some(point) = record.point() else {
                    skipped += 1;
                    continue;
                };
                let distance_km = haversine_km(center, point);
                if distance_km <= radius_km {
                    results.push(GeoCandidate {
                        record,
                        distance_km,
                    });
                }
            }
        }

        results.sort_by(compare_candidates);

        debug!(
            "Nearby ({}, {}) r={}km: {} candidates, {} skipped without coordinates, {} within radius",
            lat,
            lng,
            radius_km,
            scanned,
            skipped,
            results.len()
        );

        Ok(results)
    }
}

fn valid_query(lat: f64, lng: f64, radius_km: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && lat.abs() <= 90.0
        && lng.abs() <= 180.0
        && radius_km.is_finite()
        && radius_km >= 0.0
}

fn compare_candidates(a: &GeoCandidate, b: &GeoCandidate) -> Ordering {
    a.distance_km
        .total_cmp(&b.distance_km)
        .then_with(|| a.record.code.cmp(&b.record.code))
        .then_with(|| a.record.office_name.cmp(&b.record.office_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostOfficeRecord, RoutingCode};
    use crate::store::{MemoryStore, StoreError};
    use std::collections::BTreeSet;

    fn record(code: &str, name: &str, lat: f64, lng: f64) -> PostOfficeRecord {
        let code: RoutingCode = code.parse().unwrap();
        PostOfficeRecord::new(code, name, "New Delhi", "DELHI").at(lat, lng)
    }

    fn delhi_offices() -> Vec<PostOfficeRecord> {
        vec![
            record("110001", "Parliament House", 28.6172, 77.2082),
            record("110001", "Connaught Place", 28.6304, 77.2177),
            record("110003", "Lodi Road", 28.5910, 77.2270),
            record("110011", "Nirman Bhawan", 28.6110, 77.2090),
            record("400001", "Mumbai GPO", 18.9398, 72.8355),
        ]
    }

    fn search(records: Vec<PostOfficeRecord>) -> GeoSearch {
        GeoSearch::new(Arc::new(MemoryStore::from_records(records)))
    }

    #[test]
    fn test_connaught_place_first() {
        let results = search(delhi_offices())
            .find_nearby(28.6304, 77.2177, 2.0)
            .unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].record.office_name, "Connaught Place");
        assert_eq!(results[0].rounded_distance_km(), 0.0);
    }

    #[test]
    fn test_results_within_radius_and_sorted() {
        let center = Point::new(77.2177, 28.6304);
        let results = search(delhi_offices())
            .find_nearby(28.6304, 77.2177, 3.0)
            .unwrap();

        for pair in results.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
        for candidate in &results {
            assert!(candidate.distance_km <= 3.0);
            let point = candidate.record.point().unwrap();
            assert!((haversine_km(center, point) - candidate.distance_km).abs() < 1e-9);
        }
        // Lodi Road is ~4.5 km away
        assert!(results.iter().all(|c| c.record.office_name != "Lodi Road"));
        assert!(results.iter().all(|c| c.record.office_name != "Mumbai GPO"));
    }

    #[test]
    fn test_zero_radius_keeps_exact_matches() {
        let gs = search(delhi_offices());
        let results = gs.find_nearby(28.6304, 77.2177, 0.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].distance_km, 0.0);

        assert!(gs.find_nearby(28.0, 77.0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_queries_are_empty() {
        let gs = search(delhi_offices());
        assert!(gs.find_nearby(28.6304, 77.2177, -1.0).unwrap().is_empty());
        assert!(gs.find_nearby(f64::NAN, 77.2177, 5.0).unwrap().is_empty());
        assert!(gs.find_nearby(28.6304, 77.2177, f64::INFINITY).unwrap().is_empty());
        assert!(gs.find_nearby(95.0, 77.2177, 5.0).unwrap().is_empty());
    }

    #[test]
    fn test_equal_distances_are_ordered_by_code_then_name() {
        let records = vec![
            record("110002", "B Office", 28.7, 77.2),
            record("110001", "Z Office", 28.7, 77.2),
            record("110001", "A Office", 28.7, 77.2),
        ];
        let results = search(records).find_nearby(28.7, 77.2, 1.0).unwrap();
        let names: Vec<&str> = results
            .iter()
            .map(|c| c.record.office_name.as_str())
            .collect();
        assert_eq!(names, vec!["A Office", "Z Office", "B Office"]);
    }

    #[test]
    fn test_search_near_pole() {
        let records = vec![
            record("999001", "Polar Station", 89.999, 120.0),
            record("999002", "Other Side", 89.999, -60.0),
        ];
        let results = search(records).find_nearby(90.0, 0.0, 1.0).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_search_across_antimeridian() {
        let records = vec![
            record("999001", "East", 0.0, 179.99),
            record("999002", "West", 0.0, -179.99),
        ];
        let results = search(records).find_nearby(0.0, 179.995, 5.0).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].record.office_name, "East");
    }

    /// Store that hands back whatever it holds, coordinates or not
    struct RawStore(Vec<PostOfficeRecord>);

    impl RecordStore for RawStore {
        fn get_by_code(&self, _: &RoutingCode) -> StoreResult<Vec<PostOfficeRecord>> {
            Ok(Vec::new())
        }

        fn get_by_district(&self, _: &str, _: bool) -> StoreResult<BTreeSet<String>> {
            Ok(BTreeSet::new())
        }

        fn get_in_bounding_box(&self, _: &BoundingBox) -> StoreResult<Vec<PostOfficeRecord>> {
            Ok(self.0.clone())
        }

        fn record_count(&self) -> StoreResult<usize> {
            Ok(self.0.len())
        }
    }

    #[test]
    fn test_records_without_coordinates_are_skipped() {
        let code: RoutingCode = "110001".parse().unwrap();
        let mut no_lat = PostOfficeRecord::new(code, "No Latitude", "New Delhi", "DELHI");
        no_lat.longitude = Some(77.2177);
        let records = vec![
            PostOfficeRecord::new(code, "Unknown", "New Delhi", "DELHI"),
            no_lat,
            record("110001", "Connaught Place", 28.6304, 77.2177),
        ];

        let gs = GeoSearch::new(Arc::new(RawStore(records)));
        let results = gs.find_nearby(28.6304, 77.2177, 1.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.office_name, "Connaught Place");
    }

    struct FailingStore;

    impl RecordStore for FailingStore {
        fn get_by_code(&self, _: &RoutingCode) -> StoreResult<Vec<PostOfficeRecord>> {
            Err(StoreError::Query("offline".into()))
        }

        fn get_by_district(&self, _: &str, _: bool) -> StoreResult<BTreeSet<String>> {
            Err(StoreError::Query("offline".into()))
        }

        fn get_in_bounding_box(&self, _: &BoundingBox) -> StoreResult<Vec<PostOfficeRecord>> {
            Err(StoreError::Query("offline".into()))
        }

        fn record_count(&self) -> StoreResult<usize> {
            Err(StoreError::Query("offline".into()))
        }
    }

    #[test]
    fn test_store_errors_propagate() {
        let gs = GeoSearch::new(Arc::new(FailingStore));
        assert!(gs.find_nearby(28.6304, 77.2177, 1.0).is_err());
    }
}
