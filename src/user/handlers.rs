use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::{
    service::UserService,
    types::{LeaderboardEntry, RegisterRequest, RegisterResponse, UserResponse},
};
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> UserService {
    UserService::new(Arc::clone(&state.user_repository), state.token_config.clone())
}

/// HTTP handler for registering a user
///
/// POST /users/register
/// Returns the user and a session token
#[instrument(name = "register_user", skip(state, request))]
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let response = service(&state).register(request).await?;
    info!(user_id = %response.user.id, "User registered via API");
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /users/:user_id
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(service(&state).get_user(&user_id).await?))
}

/// GET /leaderboard
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let entries = service(&state).leaderboard().await?;
    info!(entries = entries.len(), "Leaderboard served");
    Ok(Json(entries))
}
