//! Analytics Routes
//!
//! - GET /api/v1/analytics/seasons - Seasons present in the dataset
//! - GET /api/v1/analytics/:report?season= - One of the deal reports
//!
//! Public and read-only.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::analytics::{Report, SeasonFilter};
use crate::api::dto::SeasonQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// GET /api/v1/analytics/seasons
pub async fn list_seasons(State(state): State<Arc<AppState>>) -> Json<Vec<u32>> {
    Json(state.dataset.seasons())
}

/// GET /api/v1/analytics/:report
pub async fn run_report(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<SeasonQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let report: Report = name.parse().map_err(ApiError::NotFound)?;
    let filter = SeasonFilter::from(query.season);

    let value = report
        .run(&state.dataset, filter)
        .map_err(|e| ApiError::Internal(format!("Failed to encode {} report: {}", report, e)))?;

    Ok(Json(value))
}
