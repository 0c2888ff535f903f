use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::{PredictionAction, PredictionModel},
    repository::PredictionRepository,
    types::{CreatePredictionRequest, CreatePredictionResponse, PredictionResponse},
};
use crate::{scoring::calculate_points, shared::AppError, telemetry::DriverCode};

pub const MY_PREDICTIONS_LIMIT: usize = 50;

/// Service for prediction submission and listing
pub struct PredictionService {
    repository: Arc<dyn PredictionRepository + Send + Sync>,
}

impl PredictionService {
    pub fn new(repository: Arc<dyn PredictionRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Validates and stores a new pending prediction. Unknown actions are
    /// rejected here so only recognized actions enter the store.
    #[instrument(skip(self, request))]
    pub async fn submit(
        &self,
        user_id: &str,
        request: CreatePredictionRequest,
    ) -> Result<CreatePredictionResponse, AppError> {
        let driver = DriverCode::new(&request.driver);
        if driver.is_empty() {
            return Err(AppError::BadRequest("Driver code is required".to_string()));
        }

        let action = PredictionAction::from(request.action);
        if !action.is_recognized() {
            warn!(action = %action, "Rejected prediction with unknown action");
            return Err(AppError::BadRequest(format!("Unknown action '{}'", action)));
        }

        if request.confidence < 1 {
            return Err(AppError::BadRequest(
                "Confidence must be a positive integer".to_string(),
            ));
        }
        if request.lap < 0 {
            return Err(AppError::BadRequest(
                "Lap must be 0 (any lap) or a lap number".to_string(),
            ));
        }

        let prediction = PredictionModel::new(
            user_id.to_string(),
            request.race_id,
            driver,
            action,
            request.lap,
            request.confidence,
        );
        self.repository.create_prediction(&prediction).await?;

        info!(
            prediction_id = %prediction.id,
            driver = %prediction.driver,
            action = %prediction.action,
            "Prediction submitted"
        );

        Ok(CreatePredictionResponse {
            success: true,
            points: calculate_points(prediction.confidence, None),
            prediction: prediction.into(),
        })
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PredictionResponse>, AppError> {
        let predictions = self
            .repository
            .list_for_user(user_id, MY_PREDICTIONS_LIMIT)
            .await?;
        Ok(predictions.into_iter().map(Into::into).collect())
    }

    pub async fn list_for_race(&self, race_id: i64) -> Result<Vec<PredictionResponse>, AppError> {
        let predictions = self.repository.list_for_race(race_id).await?;
        Ok(predictions.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::PredictionStatus;
    use crate::storage::InMemoryRepository;

    fn request(driver: &str, action: &str, lap: i32, confidence: i32) -> CreatePredictionRequest {
        CreatePredictionRequest {
            race_id: Some(7),
            driver: driver.to_string(),
            action: action.to_string(),
            lap,
            confidence,
        }
    }

    #[tokio::test]
    async fn submit_normalizes_and_stores_pending() {
        let repository = Arc::new(InMemoryRepository::new());
        let service = PredictionService::new(repository.clone());

        let response = service
            .submit("user-1", request(" ver", "PIT_MEDIUM", 19, 80))
            .await
            .unwrap();

        assert_eq!(response.points, 120);
        assert_eq!(response.prediction.driver, "VER");
        assert_eq!(response.prediction.action, "pit_medium");
        assert_eq!(response.prediction.status, "pending");

        let pending = repository
            .list_by_status(PredictionStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].race_id, Some(7));
    }

    #[tokio::test]
    async fn rejects_invalid_submissions() {
        let service = PredictionService::new(Arc::new(InMemoryRepository::new()));

        for bad in [
            request("", "pit_soft", 0, 10),
            request("VER", "pit_wet", 0, 10),
            request("VER", "pit_soft", 0, 0),
            request("VER", "pit_soft", -3, 10),
        ] {
            let result = service.submit("user-1", bad).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[tokio::test]
    async fn lists_only_the_users_predictions() {
        let service = PredictionService::new(Arc::new(InMemoryRepository::new()));
        service
            .submit("user-1", request("VER", "pit_soft", 0, 10))
            .await
            .unwrap();
        service
            .submit("user-2", request("LEC", "stay_out", 12, 10))
            .await
            .unwrap();

        let mine = service.list_for_user("user-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].driver, "VER");

        let race = service.list_for_race(7).await.unwrap();
        assert_eq!(race.len(), 2);
    }
}
