use async_trait::async_trait;

use super::{models::UserModel, types::LeaderboardEntry};
use crate::shared::AppError;

/// Trait for user repository operations
#[async_trait]
pub trait UserRepository {
    /// Fails with `Conflict` when the username or email is taken
    async fn create_user(&self, user: &UserModel) -> Result<(), AppError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<UserModel>, AppError>;
    /// Top users by total score, highest first, ranked from 1
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError>;
}
