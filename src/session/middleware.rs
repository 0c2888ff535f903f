use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{info, instrument, warn};

use crate::shared::{AppError, AppState};

/// Header carrying the admin credential for scoring and cache warming
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// JWT authentication middleware - validates Authorization Bearer header and adds SessionClaims to request.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), session::jwt_auth))
/// Handlers can then extract Extension(claims): Extension<SessionClaims>.
#[instrument(skip(state, req, next))]
pub async fn jwt_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("Missing authorization header".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let claims = match state.token_config.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("JWT authentication failed: {}", e);
            return Err(e);
        }
    };

    // Token may outlive the account
    if state.user_repository.get_user(&claims.user_id).await?.is_none() {
        warn!(user_id = %claims.user_id, "Token references unknown user");
        return Err(AppError::Unauthorized("User no longer exists".to_string()));
    }

    info!(
        user_id = %claims.user_id,
        username = %claims.username,
        "Authentication successful, adding claims to request"
    );

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Admin credential middleware for scoring and cache management routes.
/// The key is opaque here; it only has to match the configured one.
#[instrument(skip(state, req, next))]
pub async fn admin_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|header| header.to_str().ok())
        .unwrap_or_default();

    if provided.is_empty() || provided != state.admin_key.as_ref() {
        warn!(uri = %req.uri(), "Rejected admin request");
        return Err(AppError::Unauthorized(format!(
            "{} header required",
            ADMIN_KEY_HEADER
        )));
    }

    Ok(next.run(req).await)
}
