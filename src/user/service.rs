use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    models::UserModel,
    repository::UserRepository,
    types::{LeaderboardEntry, RegisterRequest, RegisterResponse, UserResponse},
};
use crate::{session::TokenConfig, shared::AppError};

pub const LEADERBOARD_SIZE: usize = 50;

/// Service for user registration and profile lookups
pub struct UserService {
    repository: Arc<dyn UserRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository + Send + Sync>, token_config: TokenConfig) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(AppError::BadRequest("Username cannot be empty".to_string()));
        }
        if !email.contains('@') {
            warn!("Rejected registration with malformed email");
            return Err(AppError::BadRequest("Email address is invalid".to_string()));
        }

        let user = UserModel::new(username, email);
        self.repository.create_user(&user).await?;
        let token = self.token_config.create_token(&user.id, &user.username)?;

        info!(user_id = %user.id, "User registered");
        Ok(RegisterResponse {
            user: user.into(),
            token,
        })
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserResponse, AppError> {
        self.repository
            .get_user(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.repository.leaderboard(LEADERBOARD_SIZE).await
    }
}
