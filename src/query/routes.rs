//! HTTP handlers over the query engine.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use pinpoint::config::QueryConfig;
use pinpoint::engine::EngineStats;
use pinpoint::{GeoCandidate, PostOfficeRecord, QueryEngine};

/// Application state shared across handlers
pub struct AppState {
    pub engine: QueryEngine,
    pub query: QueryConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/validate", get(validate_handler))
        .route("/v1/lookup", get(lookup_handler))
        .route("/v1/districts", get(districts_handler))
        .route("/v1/nearby", get(nearby_handler))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    #[serde(flatten)]
    stats: EngineStats,
}

/// Health check endpoint. Degraded when either dataset is empty.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = state.engine.stats();
    let healthy = stats.codes > 0 && stats.records > 0;

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        stats,
    })
}

#[derive(Deserialize)]
struct CodeParams {
    code: String,
}

#[derive(Serialize)]
struct ValidateResponse {
    code: String,
    valid: bool,
}

async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CodeParams>,
) -> Json<ValidateResponse> {
    let valid = state.engine.validate(&params.code);
    Json(ValidateResponse {
        code: params.code,
        valid,
    })
}

#[derive(Serialize)]
struct LookupResponse {
    code: String,
    records: Vec<PostOfficeRecord>,
}

async fn lookup_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CodeParams>,
) -> Json<LookupResponse> {
    let records = state.engine.lookup(&params.code);
    Json(LookupResponse {
        code: params.code,
        records,
    })
}

#[derive(Deserialize)]
struct DistrictParams {
    /// Search text
    q: String,
    /// Substring match (defaults to true)
    fuzzy: Option<bool>,
}

#[derive(Serialize)]
struct DistrictsResponse {
    districts: Vec<String>,
}

async fn districts_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DistrictParams>,
) -> Json<DistrictsResponse> {
    let districts = state
        .engine
        .search_districts(&params.q, params.fuzzy.unwrap_or(true));
    Json(DistrictsResponse { districts })
}

#[derive(Deserialize)]
struct NearbyParams {
    lat: f64,
    lng: f64,
    /// Search radius, defaults to the configured radius
    radius_km: Option<f64>,
    /// Number of results, capped by the configured maximum
    size: Option<usize>,
}

#[derive(Serialize)]
struct NearbyResponse {
    results: Vec<GeoCandidate>,
}

async fn nearby_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NearbyParams>,
) -> Json<NearbyResponse> {
    let radius_km = params.radius_km.unwrap_or(state.query.default_radius_km);
    let size = params
        .size
        .unwrap_or(state.query.max_nearby_results)
        .min(state.query.max_nearby_results);

    let mut results = state.engine.find_nearby(params.lat, params.lng, radius_km);
    results.truncate(size);

    Json(NearbyResponse { results })
}
