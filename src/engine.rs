//! Query engine facade.
//!
//! Composes the validation index, the record store and the geo search into
//! the four public operations. Every operation is total: malformed input and
//! store failures produce `false` or an empty result, never an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::config::DataConfig;
use crate::index::ValidationIndex;
use crate::models::{CodeInput, GeoCandidate, PostOfficeRecord, RoutingCode};
use crate::spatial::GeoSearch;
use crate::store::{MemoryStore, RecordStore, StoreResult};

/// Radius used when the caller does not pick one
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Dataset sizes, for health reporting
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub codes: usize,
    pub prefixes: usize,
    pub records: usize,
    pub loaded_at: DateTime<Utc>,
}

pub struct QueryEngine {
    index: ValidationIndex,
    store: Arc<dyn RecordStore>,
    geo: GeoSearch,
    loaded_at: DateTime<Utc>,
}

impl QueryEngine {
    pub fn new(index: ValidationIndex, store: Arc<dyn RecordStore>) -> Self {
        Self {
            geo: GeoSearch::new(Arc::clone(&store)),
            index,
            store,
            loaded_at: Utc::now(),
        }
    }

    /// Load both snapshots. Unavailable snapshots leave the engine empty
    /// rather than failing.
    pub fn open(config: &DataConfig) -> Self {
        let index = ValidationIndex::load(&config.validation_snapshot);
        let store = MemoryStore::load_or_empty(&config.record_snapshot);
        Self::new(index, Arc::new(store))
    }

    /// Parse and check existence; `None` for anything that is not a known code
    fn validated<'a>(&self, input: impl Into<CodeInput<'a>>) -> Option<RoutingCode> {
        let input = input.into();
        match RoutingCode::parse(input) {
            Ok(code) if self.index.contains_code(&code) => Some(code),
            Ok(code) => {
                debug!("Code {} not in validation index", code);
                None
            }
            Err(e) => {
                debug!("Rejected code {:?}: {}", input, e);
                None
            }
        }
    }

    /// Whether the input is a well-formed code present in the dataset
    pub fn validate<'a>(&self, input: impl Into<CodeInput<'a>>) -> bool {
        self.validated(input).is_some()
    }

    /// All post offices for a code. The store is only consulted once the
    /// code has passed validation.
    pub fn lookup<'a>(&self, input: impl Into<CodeInput<'a>>) -> Vec<PostOfficeRecord> {
        let Some(code) = self.validated(input) else {
            return Vec::new();
        };
        degrade("lookup", self.store.get_by_code(&code))
    }

    /// District names matching the query, sorted and deduplicated.
    ///
    /// `fuzzy` matches on case-insensitive containment, otherwise on
    /// case-insensitive equality.
    pub fn search_districts(&self, query: &str, fuzzy: bool) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        degrade("search_districts", self.store.get_by_district(query, fuzzy))
            .into_iter()
            .collect()
    }

    /// Post offices within `radius_km`, closest first. A radius that is not
    /// positive yields no results.
    pub fn find_nearby(&self, lat: f64, lng: f64, radius_km: f64) -> Vec<GeoCandidate> {
        if radius_km.is_nan() || radius_km <= 0.0 {
            return Vec::new();
        }
        degrade("find_nearby", self.geo.find_nearby(lat, lng, radius_km))
    }

    pub fn index(&self) -> &ValidationIndex {
        &self.index
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            codes: self.index.len(),
            prefixes: self.index.prefix_count(),
            records: degrade("record_count", self.store.record_count()),
            loaded_at: self.loaded_at,
        }
    }
}

/// Store failures end here: logged, then replaced by an empty result
fn degrade<T: Default>(operation: &str, result: StoreResult<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("{} failed, returning empty result: {}", operation, e);
        T::default()
    })
}

static SHARED: OnceLock<QueryEngine> = OnceLock::new();

/// Process-wide engine, loaded on first use.
///
/// Initialization runs at most once even under concurrent callers; later
/// calls return the same instance and ignore `config`.
pub fn shared(config: &DataConfig) -> &'static QueryEngine {
    SHARED.get_or_init(|| QueryEngine::open(config))
}
