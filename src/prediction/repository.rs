use async_trait::async_trait;
use std::collections::HashMap;

use super::models::{PredictionModel, PredictionStatus};
use crate::scoring::UserAggregate;
use crate::shared::AppError;

/// New terminal state for one prediction
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPrediction {
    pub prediction_id: String,
    pub status: PredictionStatus,
    pub points_earned: i64,
}

/// Trait for prediction repository operations
#[async_trait]
pub trait PredictionRepository {
    async fn create_prediction(&self, prediction: &PredictionModel) -> Result<(), AppError>;

    /// Most recent first
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<PredictionModel>, AppError>;

    async fn list_for_race(&self, race_id: i64) -> Result<Vec<PredictionModel>, AppError>;
    async fn list_by_status(
        &self,
        status: PredictionStatus,
    ) -> Result<Vec<PredictionModel>, AppError>;
    async fn list_all(&self) -> Result<Vec<PredictionModel>, AppError>;
    async fn count_by_status(&self) -> Result<HashMap<PredictionStatus, u64>, AppError>;

    /// Atomically applies outcomes, then recomputes every user's totals from
    /// the prediction set as committed, and returns those totals. Fails with
    /// `Conflict`, writing nothing, if any outcome targets a prediction that
    /// is no longer pending.
    async fn commit_scoring(
        &self,
        outcomes: Vec<ScoredPrediction>,
    ) -> Result<Vec<UserAggregate>, AppError>;
}
