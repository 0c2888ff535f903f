use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::service::{ScoreRaceRequest, ScoreSummary, ScoringPreview, StatusCounts};
use crate::shared::{AppError, AppState};

/// HTTP handler for scoring a finished race
///
/// POST /scoring/score-race (requires X-Admin-Key)
/// Body: {"year": 2024, "round": 5} with optional "race_id"
#[instrument(name = "score_race", skip(state, request), fields(year = request.year, round = request.round))]
pub async fn score_race(
    State(state): State<AppState>,
    Json(request): Json<ScoreRaceRequest>,
) -> Result<Json<ScoreSummary>, AppError> {
    if request.year <= 0 || request.round == 0 {
        return Err(AppError::BadRequest(
            "Both \"year\" and \"round\" are required".to_string(),
        ));
    }

    let summary = state.scoring_service.score_race(&request).await?;
    info!(scored = summary.scored, skipped = summary.skipped, "Scoring run finished via API");
    Ok(Json(summary))
}

/// GET /scoring/status
#[instrument(name = "scoring_status", skip(state))]
pub async fn scoring_status(State(state): State<AppState>) -> Result<Json<StatusCounts>, AppError> {
    Ok(Json(state.scoring_service.status().await?))
}

/// GET /scoring/preview/:year/:round
#[instrument(name = "preview_scoring", skip(state))]
pub async fn preview_scoring(
    State(state): State<AppState>,
    Path((year, round)): Path<(i32, u32)>,
) -> Result<Json<ScoringPreview>, AppError> {
    Ok(Json(state.scoring_service.preview(year, round).await?))
}
