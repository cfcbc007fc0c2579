//! In-memory record store with an R-tree for bounding-box queries.

use hashbrown::HashMap;
use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

use super::{district_matches, RecordStore, StoreResult};
use crate::models::{PostOfficeRecord, RoutingCode};
use crate::snapshot::{self, SnapshotError, SnapshotFormat};
use crate::spatial::BoundingBox;

/// Record position keyed by `[longitude, latitude]`
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Read-only store holding every record in memory
pub struct MemoryStore {
    records: Vec<PostOfficeRecord>,
    by_code: HashMap<RoutingCode, Vec<usize>>,
    districts: BTreeSet<String>,
    tree: RTree<IndexedPoint>,
}

impl MemoryStore {
    /// Build the code index, district list and spatial index.
    ///
    /// Records without usable coordinates are kept but never returned by a
    /// bounding-box query.
    pub fn from_records(records: Vec<PostOfficeRecord>) -> Self {
        let mut by_code: HashMap<RoutingCode, Vec<usize>> = HashMap::new();
        let mut districts = BTreeSet::new();
        let mut points = Vec::with_capacity(records.len());

        for (pos, record) in records.iter().enumerate() {
            by_code.entry(record.code).or_default().push(pos);
            if !record.district.trim().is_empty() {
                districts.insert(record.district.clone());
            }
            if let Some(point) = record.point() {
                points.push(IndexedPoint::new([point.x(), point.y()], pos));
            }
        }

        let tree = RTree::bulk_load(points);
        info!(
            "Record store built: {} records, {} codes, {} districts, {} located",
            records.len(),
            by_code.len(),
            districts.len(),
            tree.size()
        );

        Self {
            records,
            by_code,
            districts,
            tree,
        }
    }

    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    /// Load a record snapshot (`.csv`, `.json`, optionally `.gz`)
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        info!("Loading record snapshot from {}", path.display());

        let records = match SnapshotFormat::detect(path) {
            Some(SnapshotFormat::Csv) => read_csv(path)?,
            Some(SnapshotFormat::Json) => read_json(path)?,
            None => return Err(SnapshotError::UnsupportedFormat(path.to_path_buf())),
        };

        Ok(Self::from_records(records))
    }

    /// Load a record snapshot, degrading to an empty store
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(store) => store,
            Err(e) => {
                warn!("Record snapshot unavailable, serving no records: {}", e);
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_csv(path: &Path) -> Result<Vec<PostOfficeRecord>, SnapshotError> {
    let reader = snapshot::open(path)?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    // Header names are matched case-insensitively
    let headers = csv_reader
        .headers()
        .map_err(|source| SnapshotError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<csv::StringRecord>();
    csv_reader.set_headers(headers);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in csv_reader.deserialize::<PostOfficeRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(e) if e.is_io_error() => {
                return Err(SnapshotError::Csv {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "Skipped {} malformed rows in record snapshot {}",
            skipped,
            path.display()
        );
    }
    Ok(records)
}

fn read_json(path: &Path) -> Result<Vec<PostOfficeRecord>, SnapshotError> {
    // Deserialize rows individually so one bad record does not reject the file
    let rows: Vec<serde_json::Value> = snapshot::read_json(path)?;
    let total = rows.len();
    let records: Vec<PostOfficeRecord> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();

    if records.len() < total {
        warn!(
            "Skipped {} malformed rows in record snapshot {}",
            total - records.len(),
            path.display()
        );
    }
    Ok(records)
}

impl RecordStore for MemoryStore {
    fn get_by_code(&self, code: &RoutingCode) -> StoreResult<Vec<PostOfficeRecord>> {
        Ok(self
            .by_code
            .get(code)
            .map(|positions| positions.iter().map(|&i| self.records[i].clone()).collect())
            .unwrap_or_default())
    }

    fn get_by_district(&self, name: &str, fuzzy: bool) -> StoreResult<BTreeSet<String>> {
        let query = name.to_lowercase();
        Ok(self
            .districts
            .iter()
            .filter(|d| district_matches(d, &query, fuzzy))
            .cloned()
            .collect())
    }

    fn get_in_bounding_box(&self, bbox: &BoundingBox) -> StoreResult<Vec<PostOfficeRecord>> {
        if bbox.min_lat > bbox.max_lat || bbox.min_lng > bbox.max_lng {
            return Ok(Vec::new());
        }

        let envelope =
            AABB::from_corners([bbox.min_lng, bbox.min_lat], [bbox.max_lng, bbox.max_lat]);

        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|p| p.data)
            .collect();
        // Snapshot order keeps results reproducible
        positions.sort_unstable();

        Ok(positions.into_iter().map(|i| self.records[i].clone()).collect())
    }

    fn record_count(&self) -> StoreResult<usize> {
        Ok(self.records.len())
    }
}
