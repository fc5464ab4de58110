use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    auth::{self, AdminClaims},
    platform::{app_error::AppError, app_state::AppState},
};

/// Rejects requests without a valid admin bearer token and exposes the
/// [`AdminClaims`] to handlers as a request extension.
pub async fn admin_authorization(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims: AdminClaims = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| auth::verify_token(token.trim(), &state.config.auth))
        .ok_or(AppError::Unauthorized)?;

    tracing::debug!("Admin request from {}", claims.username);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
