use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

use super::{
    service::PredictionService,
    types::{CreatePredictionRequest, CreatePredictionResponse, PredictionResponse},
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};

fn service(state: &AppState) -> PredictionService {
    PredictionService::new(Arc::clone(&state.prediction_repository))
}

/// HTTP handler for submitting a prediction
///
/// POST /predictions (requires Bearer token)
#[instrument(name = "create_prediction", skip(state, claims, request), fields(user_id = %claims.user_id))]
pub async fn create_prediction(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<CreatePredictionRequest>,
) -> Result<(StatusCode, Json<CreatePredictionResponse>), AppError> {
    let response = service(&state).submit(&claims.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /predictions/mine (requires Bearer token)
#[instrument(name = "list_my_predictions", skip(state, claims), fields(user_id = %claims.user_id))]
pub async fn list_my_predictions(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<PredictionResponse>>, AppError> {
    Ok(Json(service(&state).list_for_user(&claims.user_id).await?))
}

/// GET /predictions/race/:race_id
#[instrument(name = "list_race_predictions", skip(state))]
pub async fn list_race_predictions(
    State(state): State<AppState>,
    Path(race_id): Path<i64>,
) -> Result<Json<Vec<PredictionResponse>>, AppError> {
    Ok(Json(service(&state).list_for_race(race_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::jwt_auth;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::user::{UserModel, UserRepository};
    use axum::{body::Body, http::Request, middleware, routing::post, Router};
    use tower::ServiceExt; // for `oneshot`

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/predictions", post(create_prediction))
            .layer(middleware::from_fn_with_state(state.clone(), jwt_auth))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_create_prediction_requires_token() {
        let request = Request::builder()
            .method("POST")
            .uri("/predictions")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"driver": "VER", "action": "pit_soft", "confidence": 50}"#,
            ))
            .unwrap();

        let response = app(AppStateBuilder::new().build())
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_prediction_handler() {
        let state = AppStateBuilder::new().build();
        let user = UserModel::new("strategist".to_string(), "s@pitlane.dev".to_string());
        state.user_repository.create_user(&user).await.unwrap();
        let token = state
            .token_config
            .create_token(&user.id, &user.username)
            .unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/predictions")
            .header("content-type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .body(Body::from(
                r#"{"raceId": 3, "driver": "nor", "action": "pit_hard", "lap": 28, "confidence": 60}"#,
            ))
            .unwrap();

        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let created: CreatePredictionResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(created.prediction.driver, "NOR");
        assert_eq!(created.points, 90);
    }
}
