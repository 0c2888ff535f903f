use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Database model for users table. `total_score` and `accuracy_rate` are
/// only ever written by the scoring run, as a full recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String,
    pub username: String,
    pub email: String,
    pub total_score: i64,
    pub accuracy_rate: f64,
    pub created_at: DateTime<Utc>,
}

impl UserModel {
    /// Creates a new user with zeroed aggregates
    pub fn new(username: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            total_score: 0,
            accuracy_rate: 0.0,
            created_at: Utc::now(),
        }
    }
}
