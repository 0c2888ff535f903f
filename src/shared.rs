use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::CacheError;
use crate::prediction::repository::PredictionRepository;
use crate::scoring::{ScoringError, ScoringService};
use crate::session::TokenConfig;
use crate::telemetry::{LapLookupError, RaceDataService};
use crate::user::repository::UserRepository;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub prediction_repository: Arc<dyn PredictionRepository + Send + Sync>,
    pub race_data: Arc<RaceDataService>,
    pub scoring_service: Arc<ScoringService>,
    pub token_config: TokenConfig,
    pub admin_key: Arc<str>,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository + Send + Sync>,
        prediction_repository: Arc<dyn PredictionRepository + Send + Sync>,
        race_data: Arc<RaceDataService>,
        admin_key: &str,
    ) -> Self {
        let scoring_service = Arc::new(ScoringService::new(
            race_data.clone(),
            prediction_repository.clone(),
        ));

        Self {
            user_repository,
            prediction_repository,
            race_data,
            scoring_service,
            token_config: TokenConfig::new(),
            admin_key: Arc::from(admin_key),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not cached: {0}")]
    NotCached(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl From<CacheError> for AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::Miss { key } => AppError::NotFound(format!("No cached artifact for {}", key)),
            CacheError::Producer(_) | CacheError::Timeout { .. } => {
                AppError::Upstream(err.to_string())
            }
            CacheError::Storage(_) | CacheError::Serialization(_) => {
                tracing::error!(error = %err, "Artifact cache failure");
                AppError::Internal
            }
        }
    }
}

impl From<LapLookupError> for AppError {
    fn from(err: LapLookupError) -> Self {
        match err {
            LapLookupError::Cache(e) => e.into(),
            LapLookupError::OutOfRange { .. } => AppError::BadRequest(err.to_string()),
        }
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        match err {
            ScoringError::RaceNotCached { .. } => AppError::NotCached(err.to_string()),
            ScoringError::Cache(e) => e.into(),
            ScoringError::Conflict(msg) => AppError::Conflict(msg),
            ScoringError::Repository(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::NotCached(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
