use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{
    models::{CircuitLayout, LapRecord, RaceSummary, RaceTelemetry},
    service::WarmReport,
};
use crate::shared::{AppError, AppState};

/// GET /replay/race/:year/:round
/// Fetches and caches the race on first request
#[instrument(name = "get_race_telemetry", skip(state))]
pub async fn get_race_telemetry(
    State(state): State<AppState>,
    Path((year, round)): Path<(i32, u32)>,
) -> Result<Json<RaceTelemetry>, AppError> {
    Ok(Json(state.race_data.race_telemetry(year, round).await?))
}

/// GET /replay/lap/:year/:round/:lap
#[instrument(name = "get_lap", skip(state))]
pub async fn get_lap(
    State(state): State<AppState>,
    Path((year, round, lap)): Path<(i32, u32, u32)>,
) -> Result<Json<LapRecord>, AppError> {
    Ok(Json(state.race_data.lap(year, round, lap).await?))
}

/// GET /replay/summary/:year/:round
#[instrument(name = "get_race_summary", skip(state))]
pub async fn get_race_summary(
    State(state): State<AppState>,
    Path((year, round)): Path<(i32, u32)>,
) -> Result<Json<RaceSummary>, AppError> {
    Ok(Json(state.race_data.summary(year, round).await?))
}

/// GET /replay/circuit/:year/:round
#[instrument(name = "get_circuit_layout", skip(state))]
pub async fn get_circuit_layout(
    State(state): State<AppState>,
    Path((year, round)): Path<(i32, u32)>,
) -> Result<Json<CircuitLayout>, AppError> {
    Ok(Json(state.race_data.circuit_layout(year, round).await?))
}

#[derive(Debug, Deserialize)]
pub struct WarmRequest {
    pub year: i32,
    pub rounds: Vec<u32>,
    #[serde(default)]
    pub force: bool,
}

/// HTTP handler for pre-processing races into the cache
///
/// POST /admin/warm (requires X-Admin-Key)
#[instrument(name = "warm_cache", skip(state, request), fields(year = request.year))]
pub async fn warm_cache(
    State(state): State<AppState>,
    Json(request): Json<WarmRequest>,
) -> Result<Json<WarmReport>, AppError> {
    if request.rounds.is_empty() {
        return Err(AppError::BadRequest("No rounds given".to_string()));
    }

    let report = state
        .race_data
        .warm(request.year, &request.rounds, request.force)
        .await;
    info!(
        processed = report.processed.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Cache warm finished via API"
    );
    Ok(Json(report))
}
