// Library crate for the PitLane prediction game server
// This file exposes the public API for the binary and integration tests

pub mod cache;
pub mod config;
pub mod prediction;
pub mod scoring;
pub mod session;
pub mod shared;
pub mod storage;
pub mod telemetry;
pub mod user;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

// Re-export commonly used types for easier access in tests
pub use cache::{ArtifactCache, CacheError, CacheKey, FsArtifactStore, InMemoryArtifactStore};
pub use prediction::{PredictionAction, PredictionModel, PredictionStatus};
pub use scoring::{PitStopRegistry, PredictionEvaluator, ScoreAggregator, ScoringService};
pub use shared::{AppError, AppState};
pub use storage::{InMemoryRepository, PostgresRepository};
pub use telemetry::{RaceDataProducer, RaceDataService, RaceTelemetry};

/// All HTTP routes. Prediction routes need a session token, scoring and
/// cache warming need the admin key; everything else is open.
pub fn router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/predictions", post(prediction::create_prediction))
        .route("/predictions/mine", get(prediction::list_my_predictions))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::jwt_auth,
        ));

    let admin = Router::new()
        .route("/scoring/score-race", post(scoring::score_race))
        .route("/admin/warm", post(telemetry::warm_cache))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::admin_auth,
        ));

    Router::new()
        .route("/", get(|| async { "PitLane prediction server" }))
        .route("/users/register", post(user::register_user))
        .route("/users/:user_id", get(user::get_user))
        .route("/leaderboard", get(user::get_leaderboard))
        .route(
            "/predictions/race/:race_id",
            get(prediction::list_race_predictions),
        )
        .route(
            "/replay/race/:year/:round",
            get(telemetry::get_race_telemetry),
        )
        .route("/replay/lap/:year/:round/:lap", get(telemetry::get_lap))
        .route(
            "/replay/circuit/:year/:round",
            get(telemetry::get_circuit_layout),
        )
        .route(
            "/replay/summary/:year/:round",
            get(telemetry::get_race_summary),
        )
        .route("/scoring/status", get(scoring::scoring_status))
        .route(
            "/scoring/preview/:year/:round",
            get(scoring::preview_scoring),
        )
        .merge(authenticated)
        .merge(admin)
        .with_state(state)
}
