use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::PredictionModel;

/// Request structure for prediction submission
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePredictionRequest {
    #[serde(default)]
    pub race_id: Option<i64>,
    pub driver: String,
    pub action: String,
    #[serde(default)]
    pub lap: i32,
    pub confidence: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub id: String,
    pub driver: String,
    pub action: String,
    pub lap: i32,
    pub confidence: i32,
    pub status: String,
    pub points: i64,
    pub timestamp: DateTime<Utc>,
}

impl From<PredictionModel> for PredictionResponse {
    fn from(model: PredictionModel) -> Self {
        Self {
            id: model.id,
            driver: model.driver.to_string(),
            action: model.action.to_string(),
            lap: model.predicted_lap,
            confidence: model.confidence,
            status: model.status.to_string(),
            points: model.points_earned,
            timestamp: model.created_at,
        }
    }
}

/// Response structure for prediction submission
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePredictionResponse {
    pub success: bool,
    /// Base award if the prediction comes true, before any lap bonus
    pub points: i64,
    pub prediction: PredictionResponse,
}
