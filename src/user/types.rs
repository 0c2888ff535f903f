use serde::{Deserialize, Serialize};

use super::models::UserModel;

/// Request structure for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub total_score: i64,
    pub accuracy_rate: f64,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            total_score: user.total_score,
            accuracy_rate: (user.accuracy_rate * 10.0).round() / 10.0,
        }
    }
}

/// Response structure for registration; `token` authenticates prediction calls
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub total_points: i64,
    pub accuracy: f64,
    pub predictions_count: u64,
}
